use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use careerlab_insights::{
    db, distribution, report, CsvRecordSource, DashboardMetrics, MetricCache, PgRecordSource,
    RecordSource,
};

#[derive(Parser)]
#[command(name = "careerlab-insights")]
#[command(about = "Dashboard metrics for CareerLab coaching data", long_about = None)]
struct Cli {
    /// Read records from a CSV snapshot directory instead of Postgres.
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,
    /// Print metrics as JSON instead of text lines.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AspectSource {
    Cv,
    Interview,
}

#[derive(Clone, Copy, ValueEnum)]
enum DistributionField {
    Career,
    Cycle,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Most common aspects flagged for improvement
    Aspects {
        #[arg(long, value_enum, default_value = "cv")]
        source: AspectSource,
    },
    /// Top five users by average CV score (or bottom five)
    Performers {
        #[arg(long)]
        bottom: bool,
    },
    /// Interview score trend across trials
    Trend,
    /// Tool usage split among applications that reached an interview
    ToolImpact,
    /// Career or cycle spread across users
    Distribution {
        #[arg(long, value_enum)]
        by: DistributionField,
        #[arg(long)]
        min_pct: Option<f64>,
    },
    /// Record counts across every category
    Summary,
    /// Generate a markdown report covering every metric
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        command => {
            if let Some(dir) = cli.csv_dir {
                let metrics = DashboardMetrics::new(CsvRecordSource::new(dir), MetricCache::new());
                run_command(&metrics, command, cli.json).await?;
            } else {
                let pool = connect().await?;
                let metrics = DashboardMetrics::new(PgRecordSource::new(pool), MetricCache::new());
                run_command(&metrics, command, cli.json).await?;
            }
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<sqlx::PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set (or pass --csv-dir for a CSV snapshot)")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn run_command<S: RecordSource>(
    metrics: &DashboardMetrics<S>,
    command: Commands,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Commands::InitDb | Commands::Seed => unreachable!("handled before source selection"),
        Commands::Aspects { source } => {
            let items = match source {
                AspectSource::Cv => metrics.cv_aspects_to_improve().await,
                AspectSource::Interview => metrics.interview_aspects_to_improve().await,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("No recurring aspects above the cutoff.");
            } else {
                for item in items {
                    println!("- {}: {:.0}%", item.label, item.percentage);
                }
            }
        }
        Commands::Performers { bottom } => {
            let users = if bottom {
                metrics.bottom_performers().await
            } else {
                metrics.top_performers().await
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else if users.is_empty() {
                println!("No users with scored evaluations.");
            } else {
                for user in users {
                    println!(
                        "- {} ({}, cycle {}) avg {:.1} across {} analyses",
                        user.name,
                        user.career.as_deref().unwrap_or("unknown career"),
                        user.cycle.as_deref().unwrap_or("unknown"),
                        user.average_score,
                        user.analysis_count
                    );
                }
            }
        }
        Commands::Trend => {
            let points = metrics.trend_series().await;
            let stats = metrics.trend_stats().await;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "points": points,
                        "stats": stats,
                    }))?
                );
            } else if points.is_empty() {
                println!("No completed sessions yet.");
            } else {
                for point in points {
                    println!(
                        "- Trial {}: avg {:.1} over {} sessions (min {:.1}, max {:.1})",
                        point.trial_index,
                        point.average_score,
                        point.sample_count,
                        point.min_score,
                        point.max_score
                    );
                }
                println!(
                    "Improvement since first trial: {:+.1} across {} users.",
                    stats.improvement, stats.total_users
                );
            }
        }
        Commands::ToolImpact => {
            let stats = metrics.tool_impact_stats().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else if stats.total_eligible == 0 {
                println!("No applications reached an interview yet.");
            } else {
                for slice in metrics.tool_impact_chart().await {
                    println!(
                        "- {}: {} applications ({:.0}%)",
                        slice.label, slice.count, slice.percentage
                    );
                }
            }
        }
        Commands::Distribution { by, min_pct } => {
            let items = match by {
                DistributionField::Career => {
                    metrics
                        .career_distribution(
                            min_pct.unwrap_or(distribution::CAREER_MIN_PERCENTAGE),
                        )
                        .await
                }
                DistributionField::Cycle => {
                    metrics
                        .cycle_distribution(min_pct.unwrap_or(distribution::CYCLE_MIN_PERCENTAGE))
                        .await
                }
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("No categories above the threshold.");
            } else {
                for item in items {
                    println!("- {}: {} users ({:.1}%)", item.label, item.count, item.percentage);
                }
            }
        }
        Commands::Summary => {
            let summary = metrics.summary().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Users: {}", summary.total_users);
                println!("CV evaluations: {}", summary.total_cv_evaluations);
                println!("Interview sessions: {}", summary.total_interview_sessions);
                println!("Applications: {}", summary.total_applications);
            }
        }
        Commands::Report { out } => {
            let rendered = report::build_report(metrics).await;
            std::fs::write(&out, rendered)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
