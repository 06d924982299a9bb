//! `croprisk query …`: one subcommand per analytical question.

use clap::Subcommand;
use croprisk_core::{query::Scope, store::RiskStore};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum Query {
  /// Every known commodity.
  Commodities,
  /// Every known country or region.
  Countries,
  /// Country with the highest current-year risk.
  HighestCurrentRisk {
    #[arg(long)]
    commodity: Option<String>,
  },
  /// One year's risk against its historical average.
  CompareCountryYearVsHist {
    #[arg(long)]
    commodity:    String,
    #[arg(long)]
    country_code: String,
    #[arg(long)]
    year:         i64,
  },
  /// Most recent most-similar-year analogy.
  MostSimilarYear {
    #[arg(long)]
    commodity:    String,
    #[arg(long, default_value = "global")]
    scope:        String,
    #[arg(long)]
    country_code: Option<String>,
  },
  /// Global average risk for a month of a year.
  GlobalAvgForMonth {
    #[arg(long)]
    commodity: String,
    #[arg(long)]
    year:      i64,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month:     u32,
  },
  /// Countries with the lowest historical risk.
  TopKLowestHistRisk {
    #[arg(long)]
    commodity: String,
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(1..=50))]
    k:         u64,
  },
  /// Countries with the highest current risk.
  TopKHighestCurrentRisk {
    #[arg(long)]
    commodity: String,
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=50))]
    k:         u64,
  },
  /// Yearly maximum risk over an inclusive range of years.
  TrendMaxRisk {
    #[arg(long)]
    commodity:    String,
    #[arg(long)]
    start_year:   i64,
    #[arg(long)]
    end_year:     i64,
    #[arg(long, default_value = "global")]
    scope:        String,
    #[arg(long)]
    country_code: Option<String>,
  },
  /// Latest season against the previous one.
  CountrySeasonChange {
    #[arg(long)]
    commodity:    String,
    #[arg(long)]
    country_code: String,
  },
  /// Yield metrics next to the matching risk aggregate.
  YieldAndRiskRelation {
    #[arg(long)]
    commodity:    String,
    #[arg(long, default_value = "global")]
    scope:        String,
    #[arg(long)]
    country_code: Option<String>,
  },
  /// Regions expected to spike in the upcoming season.
  UpcomingSpikeRegions {
    #[arg(long)]
    commodity: String,
    #[arg(long, default_value_t = 0.0)]
    threshold: f64,
  },
  /// Mean risk of an aggregate region in two years.
  RegionalComparison {
    #[arg(long, default_value = "EU")]
    region:        String,
    /// Omit to average across every commodity.
    #[arg(long)]
    commodity:     Option<String>,
    #[arg(long)]
    current_year:  i64,
    #[arg(long)]
    previous_year: i64,
  },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Run `query` against `store` and print the answer as JSON. No data prints
/// `null` (or `[]` for lists).
pub async fn run<S>(store: &S, query: Query) -> anyhow::Result<()>
where
  S: RiskStore,
{
  match query {
    Query::Commodities => print_json(&store.commodities().await?),
    Query::Countries => print_json(&store.countries().await?),
    Query::HighestCurrentRisk { commodity } => {
      print_json(&store.highest_current_risk(commodity).await?)
    }
    Query::CompareCountryYearVsHist { commodity, country_code, year } => {
      print_json(&store.compare_to_history(commodity, country_code, year).await?)
    }
    Query::MostSimilarYear { commodity, scope, country_code } => {
      let scope = Scope::from_parts(&scope, country_code)?;
      print_json(&store.most_similar_year(commodity, scope).await?)
    }
    Query::GlobalAvgForMonth { commodity, year, month } => {
      print_json(&store.global_average(commodity, year, month).await?)
    }
    Query::TopKLowestHistRisk { commodity, k } => {
      print_json(&store.lowest_historical_risk(commodity, k as usize).await?)
    }
    Query::TopKHighestCurrentRisk { commodity, k } => {
      print_json(&store.top_current_risk(commodity, k as usize).await?)
    }
    Query::TrendMaxRisk { commodity, start_year, end_year, scope, country_code } => {
      let scope = Scope::from_parts(&scope, country_code)?;
      print_json(&store.max_risk_trend(commodity, scope, start_year, end_year).await?)
    }
    Query::CountrySeasonChange { commodity, country_code } => {
      print_json(&store.season_change(commodity, country_code).await?)
    }
    Query::YieldAndRiskRelation { commodity, scope, country_code } => {
      let scope = Scope::from_parts(&scope, country_code)?;
      print_json(&store.yield_risk_relation(commodity, scope).await?)
    }
    Query::UpcomingSpikeRegions { commodity, threshold } => {
      print_json(&store.upcoming_spikes(commodity, threshold).await?)
    }
    Query::RegionalComparison { region, commodity, current_year, previous_year } => {
      print_json(
        &store
          .regional_comparison(region, commodity, current_year, previous_year)
          .await?,
      )
    }
  }
}
