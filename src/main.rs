//! # reportform CLI
//!
//! Usage:
//!   reportform render report.json -o report.pdf
//!   cat report.json | reportform render --html report.html
//!   reportform fetch --industry retail --id 42 --token $TOKEN
//!   reportform example > report.json

use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reportform::config::ReportConfig;
use reportform::layout::LayoutEngine;
use reportform::model::Industry;
use reportform::pdf::ExportedDocument;
use reportform::screen::ScreenSink;
use reportform::source::{ReportState, ReportView, Session};
use reportform::RenderInput;

/// Compose, paginate and export SME financial-health reports.
#[derive(Parser, Debug)]
#[command(name = "reportform", version, about, long_about = None)]
struct Cli {
    /// JSON configuration file. `REPORTFORM_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a report from saved analysis and AI payloads.
    Render {
        /// Input JSON. Reads stdin when omitted.
        input: Option<PathBuf>,
        /// PDF output path. Defaults to `{Industry}_Report_{id}.pdf`.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the on-screen rendition as HTML.
        #[arg(long)]
        html: Option<PathBuf>,
        /// Print the positioned draw operations as JSON instead of writing a PDF.
        #[arg(long)]
        ops: bool,
    },
    /// Fetch a report from the analysis service and export it.
    Fetch {
        #[arg(long)]
        industry: Industry,
        #[arg(long)]
        id: String,
        /// Bearer token of the signed-in user.
        #[arg(long)]
        token: String,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a sample render input.
    Example,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            input,
            output,
            html,
            ops,
        } => {
            let json = read_input(input.as_deref())?;
            let input: RenderInput = serde_json::from_str(&json)
                .map_err(reportform::error::ReportError::from)?;
            let model = reportform::compose(&input, &config)?;

            if let Some(path) = html {
                let markup = ScreenSink::render_html(&model);
                fs::write(&path, &markup)?;
                eprintln!("✓ Written {} bytes to {}", markup.len(), path.display());
            }

            if ops {
                let ops = LayoutEngine::new().layout(&model, &config.geometry());
                println!("{}", serde_json::to_string_pretty(&ops)?);
                return Ok(());
            }

            let doc = reportform::render(&model, &config)?;
            write_document(&doc, output)
        }
        Commands::Fetch {
            industry,
            id,
            token,
            base_url,
            output,
        } => {
            let mut config = config;
            if let Some(url) = base_url {
                config.base_url = url;
            }
            let view = ReportView::open(&config, &Session::bearer(token), industry, &id).await?;
            if let ReportState::Failed { reason } = view.state() {
                return Err(format!("report {id} could not be loaded: {reason}").into());
            }
            match view.export()? {
                Some(doc) => write_document(&doc, output),
                None => Err(format!("report {id} is not ready").into()),
            }
        }
        Commands::Example => {
            print!("{}", example_input_json());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ReportConfig, Box<dyn Error>> {
    let base = match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text).map_err(reportform::error::ReportError::from)?
        }
        None => ReportConfig::default(),
    };
    Ok(base.with_overrides(|var| std::env::var(var).ok())?)
}

fn read_input(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn write_document(doc: &ExportedDocument, output: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let path = output.unwrap_or_else(|| PathBuf::from(&doc.filename));
    fs::write(&path, &doc.bytes)?;
    eprintln!("✓ Written {} bytes to {}", doc.bytes.len(), path.display());
    Ok(())
}

fn example_input_json() -> &'static str {
    r##"{
  "industry": "Retail",
  "report_id": "42",
  "generated_at": "2026-01-15T09:30:00Z",
  "analysis": {
    "id": 42,
    "financials": {
      "total_revenue": 1250000,
      "total_expenses": 980000,
      "profit": 270000,
      "effective_profit": 270000,
      "profit_margin": 21.6
    },
    "health": {
      "health_score": 74,
      "health_status": "Good",
      "credit_risk": "Low"
    }
  },
  "ai": {
    "id": 42,
    "ai_explanation": {
      "Good": [
        "Revenue grew steadily across the last three quarters.",
        "Operating expenses stayed below 80% of revenue."
      ],
      "Risks": [
        "Inventory turnover slowed in the festive season.",
        "Two suppliers account for most purchases."
      ],
      "Improvement": [
        {
          "action": "Negotiate extended payment terms with key suppliers",
          "benefit": "Frees working capital for seasonal stock",
          "timeline": "Next 3 months"
        },
        {
          "action": "Clear slow-moving stock through bundled offers",
          "benefit": "Improves inventory turnover and cash position",
          "timeline": "Next 6 weeks"
        }
      ],
      "Guidance": "The business is profitable with a healthy margin. Focus on working capital discipline before expanding to new locations.",
      "ProductRecommendations": {
        "System": [
          {
            "product": "Working capital loan",
            "reason": "Smooths seasonal inventory purchases"
          }
        ],
        "Additional": [
          {
            "product": "Merchant payment gateway",
            "reason": "Shortens settlement cycles for card sales"
          }
        ]
      }
    }
  }
}
"##
}
