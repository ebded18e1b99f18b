use clap::Parser;
use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use csvpeek::controller::Controller;
use csvpeek::domain::{PeekConfig, PeekError};
use csvpeek::loader::{self, expand_path};
use csvpeek::model::{Model, Status};
use csvpeek::pipeline::{DEFAULT_PAGE_SIZE, PipelineParams, run};
use csvpeek::table::{SortDirection, Table};
use csvpeek::ui::{TableUI, render_text};

/// Preview comma separated text with search, sort and pagination.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File to preview, `-` reads stdin
    path: String,

    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Only show rows containing this text (case insensitive)
    #[arg(long)]
    search: Option<String>,

    /// Sort by this column (0-based)
    #[arg(long)]
    sort_column: Option<usize>,

    /// asc or desc
    #[arg(long, default_value_t = SortDirection::Ascending)]
    sort_direction: SortDirection,

    /// Page to show first (1-based)
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Print the page to stdout instead of opening the viewer
    #[arg(long)]
    print: bool,

    /// Where log output goes, filter with CSVPEEK_LOG
    #[arg(long, default_value = "csvpeek.log")]
    log_file: String,

    /// Widest a column is rendered before it gets cut
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Milliseconds to wait for a key event per loop
    #[arg(long, default_value_t = 100)]
    event_poll_time: u64,
}

impl Args {
    fn config(&self) -> Result<PeekConfig, PeekError> {
        Ok(PeekConfig::default()
            .with_page_size(self.page_size.max(1))
            .with_max_column_width(self.max_column_width.max(3))
            .with_event_poll_time(self.event_poll_time)
            .with_log_file(expand_path(&self.log_file)?))
    }

    fn params(&self, config: &PeekConfig) -> PipelineParams {
        PipelineParams::new(config.page_size)
            .with_search_term(self.search.clone().unwrap_or_default())
            .with_sort_column(self.sort_column)
            .with_sort_direction(self.sort_direction)
            .with_page(self.page.max(1))
    }
}

fn main() -> ExitCode {
    match run_app() {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(config: &PeekConfig) -> Result<(), PeekError> {
    let filter = EnvFilter::try_from_env("CSVPEEK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let file = File::create(&config.log_file)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run_app() -> Result<(), PeekError> {
    let args = Args::parse();
    let config = args.config()?;
    init_logging(&config)?;
    info!("Starting csvpeek with {:?}", args);

    let (source, table) = loader::load(&args.path)?;
    let params = args.params(&config);

    if args.print {
        print_page(&config, &table, &params);
        return Ok(());
    }

    let mut terminal = ratatui::init();
    let result = event_loop(&config, source.describe(), table, params, &mut terminal);
    ratatui::restore();
    result
}

fn print_page(config: &PeekConfig, table: &Table, params: &PipelineParams) {
    let view = run(table, params);
    println!(
        "{}",
        render_text(
            &view,
            params.sort_column,
            params.sort_direction,
            table.total_row_count,
            config.max_column_width,
        )
    );
}

fn event_loop(
    config: &PeekConfig,
    name: String,
    table: Table,
    params: PipelineParams,
    terminal: &mut ratatui::DefaultTerminal,
) -> Result<(), PeekError> {
    let mut model = Model::init(name, table, params);
    let mut ui = TableUI::new(config);
    let controller = Controller::new(config);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }
    info!("Quitting csvpeek");
    Ok(())
}
