//! # sale-admin
//!
//! Terminal front end for the Sale screens.
//!
//! ## Usage
//! ```bash
//! # Read-only detail of Sale 7
//! sale-admin show 7
//!
//! # Create a Sale; the date defaults to now
//! sale-admin new --device 3 --price 250 --addon 1 --addon 2
//!
//! # Edit Sale 7, keeping every field not given on the command line
//! sale-admin edit 7 --price 199.99
//!
//! # Against a seeded in-memory store, printing the view as JSON
//! sale-admin --memory --json edit 1 --customization 3
//! ```
//!
//! Exit status is 0 on success, 1 when the screen reports an error and 2
//! when the console cannot start.

mod config;
mod error;
mod render;
mod seed;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use sale_core::{EntityId, FieldValue, SaleFormValues};
use sale_screen::{HistoryNavigator, LoadStatus, MountParams, Navigator, SaleScreen, ScreenState, ScreenView};
use sale_store::{HttpStore, RemoteStore};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ConsoleConfig;
use crate::error::ConsoleResult;
use crate::render::TextView;

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "sale-admin", about = "View, create and edit Sales")]
struct Cli {
    /// Config file; defaults to the platform config directory.
    #[arg(long, global = true, env = "SALE_ADMIN_CONFIG")]
    config: Option<PathBuf>,

    /// Use a seeded in-memory store instead of the remote one.
    #[arg(long, global = true)]
    memory: bool,

    /// Print the screen view as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one Sale read-only.
    Show {
        id: EntityId,
    },
    /// Create a Sale.
    New(FormArgs),
    /// Edit an existing Sale.
    Edit {
        id: EntityId,

        #[command(flatten)]
        form: FormArgs,
    },
}

/// Field edits applied over the form defaults.
#[derive(Args, Debug, Default)]
struct FormArgs {
    /// Sale date as `YYYY-MM-DDTHH:MM` local time.
    #[arg(long)]
    date: Option<String>,

    /// Final price, e.g. `199.99`.
    #[arg(long)]
    price: Option<String>,

    /// Device id.
    #[arg(long)]
    device: Option<String>,

    /// Customization id; repeat for several. Replaces the current list.
    #[arg(long = "customization")]
    customizations: Vec<String>,

    /// Addon id; repeat for several. Replaces the current list.
    #[arg(long = "addon")]
    addons: Vec<String>,

    /// Clear the customization list.
    #[arg(long, conflicts_with = "customizations")]
    no_customizations: bool,

    /// Clear the addon list.
    #[arg(long, conflicts_with = "addons")]
    no_addons: bool,

    /// Validate and print the form without submitting.
    #[arg(long)]
    dry_run: bool,
}

impl FormArgs {
    fn apply(&self, values: &mut SaleFormValues) {
        if let Some(date) = &self.date {
            values.sale_date = Some(date.clone());
        }
        if let Some(price) = &self.price {
            values.final_price = Some(FieldValue::from(price));
        }
        if let Some(device) = &self.device {
            values.device = Some(FieldValue::from(device));
        }
        if self.no_customizations {
            values.customizations.clear();
        } else if !self.customizations.is_empty() {
            values.customizations = self.customizations.iter().map(FieldValue::from).collect();
        }
        if self.no_addons {
            values.addons.clear();
        } else if !self.addons.is_empty() {
            values.addons = self.addons.iter().map(FieldValue::from).collect();
        }
    }
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConsoleConfig::load(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };
    init_tracing(&config.log_filter);

    let outcome = if cli.memory {
        match seed::demo_store() {
            Ok(store) => run(Arc::new(store), &cli).await,
            Err(e) => Err(e.into()),
        }
    } else {
        match http_store(&config) {
            Ok(store) => run(Arc::new(store), &cli).await,
            Err(e) => Err(e),
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing to stderr. `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn http_store(config: &ConsoleConfig) -> ConsoleResult<HttpStore> {
    let store_config = config.store_config()?;
    info!(base_url = %store_config.base_url, "Using remote store");
    Ok(HttpStore::new(store_config)?)
}

/// Runs one command. `Ok(false)` means the screen ended in an error state.
async fn run<S: RemoteStore>(store: Arc<S>, cli: &Cli) -> ConsoleResult<bool> {
    let navigator = Arc::new(HistoryNavigator::new());

    let (view, ok) = match &cli.command {
        Command::Show { id } => show(store, navigator.clone(), *id).await?,
        Command::New(form) => edit(store, navigator.clone(), MountParams::new_sale(), form).await?,
        Command::Edit { id, form } => {
            edit(store, navigator.clone(), MountParams::edit(*id), form).await?
        }
    };

    if let Some(path) = navigator.current() {
        debug!(%path, "Final route");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", TextView(&view));
    }
    Ok(ok)
}

async fn show<S: RemoteStore>(
    store: Arc<S>,
    navigator: Arc<dyn Navigator>,
    id: EntityId,
) -> ConsoleResult<(ScreenView, bool)> {
    let mut screen = SaleScreen::mount(store, navigator, MountParams::detail(id))?;
    screen.settle().await;

    let view = screen.view();
    let ok = view.sale_status == LoadStatus::Loaded;
    Ok((view, ok))
}

async fn edit<S: RemoteStore>(
    store: Arc<S>,
    navigator: Arc<dyn Navigator>,
    params: MountParams,
    form: &FormArgs,
) -> ConsoleResult<(ScreenView, bool)> {
    let mut screen = SaleScreen::mount(store, navigator, params)?;
    screen.settle().await;

    let mut values = screen.default_values().unwrap_or_default();
    form.apply(&mut values);

    if form.dry_run {
        let ok = match screen.validate(&values) {
            Ok(()) => true,
            Err(errors) => {
                for (field, message) in errors.iter() {
                    warn!(field, "{}", message);
                }
                false
            }
        };
        return Ok((screen.view(), ok));
    }

    // a blocked submit is recorded on the screen and shows up in the view
    if screen.submit(values).is_ok() {
        screen.settle().await;
    }

    let view = screen.view();
    let ok = view.state == ScreenState::SubmitSucceeded;
    Ok((view, ok))
}

// =============================================================================
// Unit Tests
// =============================================================================
