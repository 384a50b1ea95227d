#![cfg(not(tarpaulin_include))]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use survey_dashboard::client::ApiClient;
use survey_dashboard::config::ClientConfig;
use survey_dashboard::graph::boxplot::{self, BoxSeries, DomainMode};
use survey_dashboard::graph::heatmap::{self, HeatmapFilter};
use survey_dashboard::graph::{ChartOptions, error_bars};
use survey_dashboard::loader::{DataLoader, LoadState, RetryPolicy};
use survey_dashboard::model::{CorrelationMethod, RespondentType, TeacherCategory, TeacherFilter};
use survey_dashboard::session::SessionContext;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "dashboard-cli")]
#[command(about = "Dashboard client: loads the survey statistics and renders the charts", long_about = None)]
struct Cli {
    #[command(flatten)]
    client: ClientConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dashboard data, importing it first if the server is empty
    Load {
        /// Include teachers not currently teaching
        #[arg(long)]
        include_non_teaching: bool,
        /// Only teachers not currently teaching
        #[arg(long)]
        only_non_teaching: bool,
    },
    /// Render every chart as SVG into a directory
    Charts {
        #[arg(long, default_value = "charts")]
        out: PathBuf,
        /// Hide correlations with |r| below this value (0 to 0.7)
        #[arg(long, default_value_t = 0.0)]
        min_correlation: f64,
        /// Hide non-significant correlations
        #[arg(long)]
        significant_only: bool,
        #[arg(long, default_value = "pearson")]
        method: String,
    },
    /// Download the comparison CSV and the correlation workbooks
    Export {
        #[arg(long, default_value = "exports")]
        out: PathBuf,
    },
    /// Open an editor session
    Login {
        #[arg(long, env = "DASHBOARD_EDITOR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Close the editor session
    Logout,
    /// Print the homepage, or replace it with the content of a file
    Homepage {
        #[arg(long)]
        set: Option<PathBuf>,
    },
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            token.cancel();
        }
    });
}

async fn load(api: ApiClient, filter: TeacherFilter) -> anyhow::Result<()> {
    let loader = DataLoader::new(api, RetryPolicy::default()).with_filter(filter);
    let mut states = loader.subscribe();
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let progress = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            match state {
                LoadState::CheckingHealth => info!("Connessione al backend..."),
                LoadState::Importing => info!("Importazione dati in corso..."),
                LoadState::Loading { attempt } => info!("Caricamento... (tentativo {})", attempt),
                _ => {}
            }
        }
    });

    let result = loader.run(&cancel).await;
    let final_state = loader.state();
    drop(loader);
    progress.abort();

    match (result, final_state) {
        (Ok(data), _) => {
            println!("Studenti: {} risposte", data.students.total_responses);
            println!("Insegnanti: {} risposte", data.teachers.total_responses);
            println!("Confronti: {} item", data.comparison.comparisons.len());
            println!("Strumenti citati: {}", data.tools.student_tools.len() + data.tools.teacher_tools.len());
            Ok(())
        }
        (Err(_), LoadState::Failed(message)) => bail!(message),
        (Err(e), _) => Err(e.into()),
    }
}

fn write(out: &Path, name: &str, contents: impl AsRef<[u8]>) -> anyhow::Result<()> {
    let path = out.join(name);
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}

async fn charts(
    api: &ApiClient,
    out: &Path,
    filter: HeatmapFilter,
    method: CorrelationMethod,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;

    for category in [TeacherCategory::Active, TeacherCategory::Training, TeacherCategory::All] {
        let data = api.comparison_with_ci(TeacherFilter::for_category(category)).await?;
        let layout = error_bars::layout(&data.comparisons);
        for w in &layout.warnings {
            warn!("{}: {}", w.subject, w.message);
        }
        let options = ChartOptions::titled(format!("Studenti vs {} (IC 95%)", category.label()));
        let svg = error_bars::render_svg(&layout, category, &options)?;
        write(out, &format!("confronto_{}.svg", category.key()), svg)?;
    }

    for respondent_type in [RespondentType::Student, RespondentType::Teacher] {
        let matrix = api
            .correlation_matrix(respondent_type, method, TeacherFilter::default())
            .await?;
        let options = ChartOptions::titled(format!("Correlazioni - {}", respondent_type));
        let svg = heatmap::render_svg(&heatmap::build_grid(&matrix, &filter), &options)?;
        write(out, &format!("correlazioni_{}.svg", respondent_type), svg)?;
        let svg = heatmap::render_grouped_svg(&heatmap::build_grouped(&matrix, &filter), &options)?;
        write(out, &format!("correlazioni_{}_gruppi.svg", respondent_type), svg)?;
    }

    for question in api.likert_questions().await? {
        if question.groups.is_empty() {
            continue;
        }
        let series: Vec<BoxSeries> = question.groups.iter().map(BoxSeries::from_group).collect();
        let options = ChartOptions::titled(question.question.question_text.clone());
        let svg = boxplot::render_svg(&series, &options, DomainMode::default())?;
        let name = format!(
            "likert_{}_{}.svg",
            question.question.respondent_type, question.question.column_index
        );
        write(out, &name, svg)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.client)?;
    let mut session = SessionContext::init(&cli.client.session_file)?;

    match cli.command {
        Commands::Load {
            include_non_teaching,
            only_non_teaching,
        } => {
            let filter = TeacherFilter {
                include_non_teaching,
                only_non_teaching,
            };
            load(api, filter).await?;
        }
        Commands::Charts {
            out,
            min_correlation,
            significant_only,
            method,
        } => {
            let method: CorrelationMethod = method.parse()?;
            charts(&api, &out, HeatmapFilter::new(min_correlation, significant_only), method).await?;
        }
        Commands::Export { out } => {
            std::fs::create_dir_all(&out).with_context(|| format!("failed to create {}", out.display()))?;
            write(&out, "confronto.csv", api.export_comparison_csv().await?)?;
            for rt in [RespondentType::Student, RespondentType::Teacher] {
                write(&out, &format!("correlazioni_{}.xlsx", rt), api.export_correlation_xlsx(rt).await?)?;
            }
        }
        Commands::Login { password } => {
            let response = api.login(&password).await?;
            session.establish(response.token)?;
            println!("Sessione aperta, valida {} ore", response.expires_in / 3600);
        }
        Commands::Logout => {
            if let Some(token) = session.token() {
                api.logout(token).await?;
            }
            session.teardown()?;
            println!("Sessione chiusa");
        }
        Commands::Homepage { set: None } => {
            print!("{}", api.homepage().await?.content);
        }
        Commands::Homepage { set: Some(file) } => {
            let Some(token) = session.token() else {
                bail!("nessuna sessione: eseguire prima `dashboard-cli login`");
            };
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let update = api.update_homepage(token, &content).await?;
            println!("{}", update.message);
        }
    }
    Ok(())
}
