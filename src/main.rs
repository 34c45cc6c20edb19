//! Ticketdesk CLI
//!
//! Command-line front end for the ticket desk:
//! - List, inspect and update tickets
//! - Watch the dashboard with auto-refresh
//! - Export the current view as CSV
//! - Submit public quote, contact and project forms
//! - Manage local preferences

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use ticketdesk::client::{HttpBackend, ListFilters};
use ticketdesk::config::{generate_default_config, Config, LoggingConfig};
use ticketdesk::export::{default_export_path, write_csv, ExportError};
use ticketdesk::forms::{
    ContactRequest, FormClient, FormError, ProjectDraft, ProjectRequest, QuoteRequest,
};
use ticketdesk::model::{
    disable_auto_refresh, enable_auto_refresh, FetchOutcome, TicketEdit, TicketViewModel,
};
use ticketdesk::prefs::{PrefsStore, Theme};
use ticketdesk::render::{ConsoleShell, Layout, TerminalView};
use ticketdesk::ticket::{Status, Ticket};
use ticketdesk::view::format_age;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ticketdesk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Admin client for the customer ticket desk")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overriding the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    /// Free-text search
    #[arg(short, long)]
    pub query: Option<String>,
    /// Kind filter (e.g. "Quick Quote")
    #[arg(short, long)]
    pub kind: Option<String>,
    /// Status filter (open, wip, resolved)
    #[arg(short, long)]
    pub status: Option<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> ListFilters {
        let mut filters = ListFilters::new();
        if let Some(q) = &self.query {
            filters = filters.query(q.as_str());
        }
        if let Some(kind) = &self.kind {
            filters = filters.kind(kind.as_str());
        }
        if let Some(status) = &self.status {
            filters = filters.status(status.as_str());
        }
        filters
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tickets
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one ticket with its history
    Show {
        /// Ticket id
        ticket: String,
    },

    /// Set a ticket's status
    Set {
        /// Ticket id
        ticket: String,
        /// New status (open, wip, resolved)
        status: String,
    },

    /// Set the status of several tickets at once
    Bulk {
        /// New status (open, wip, resolved)
        status: String,
        /// Ticket ids
        tickets: Vec<String>,
    },

    /// Edit status and note, optionally emailing the client
    Edit {
        /// Ticket id
        ticket: String,
        /// New status (default: unchanged)
        #[arg(long)]
        status: Option<String>,
        /// Admin note
        #[arg(short, long, default_value = "")]
        note: String,
        /// Email the client about this update
        #[arg(long)]
        email: bool,
        /// Email subject (default: "Update on Ticket <id>")
        #[arg(long)]
        subject: Option<String>,
    },

    /// Export tickets to CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output file (default: tickets_<date>.csv in the export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the dashboard and refresh it until Ctrl-C
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
        /// Seconds between refreshes (default: from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Submit a public form
    Submit {
        #[command(subcommand)]
        form: SubmitForm,
    },

    /// Show or change the dashboard theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },

    /// Show or clear the saved project draft
    Draft {
        #[command(subcommand)]
        action: Option<DraftAction>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SubmitForm {
    /// Send a contact message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },

    /// Request a quick quote
    Quote {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Project type
        #[arg(long)]
        ptype: String,
        #[arg(long, default_value = "")]
        voltage: String,
        /// Desired timing
        #[arg(long, default_value = "")]
        when: String,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Submit a project intake; unset fields come from the saved draft
    Project(ProjectArgs),
}

#[derive(Args)]
pub struct ProjectArgs {
    #[arg(long)]
    pub org: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub ptype: Option<String>,
    #[arg(long)]
    pub mode: Option<String>,
    #[arg(long)]
    pub voltage: Option<String>,
    /// Purchase order date
    #[arg(long)]
    pub podate: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Request a site visit
    #[arg(long)]
    pub visit: bool,
    /// Attachment (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,
    /// Only save the draft, do not submit
    #[arg(long)]
    pub save_only: bool,
}

impl ProjectArgs {
    /// Overlay the given fields on a saved draft
    fn merge_into(&self, mut draft: ProjectDraft) -> ProjectDraft {
        let fields = [
            (&mut draft.org, &self.org),
            (&mut draft.name, &self.name),
            (&mut draft.email, &self.email),
            (&mut draft.phone, &self.phone),
            (&mut draft.location, &self.location),
            (&mut draft.ptype, &self.ptype),
            (&mut draft.mode, &self.mode),
            (&mut draft.voltage, &self.voltage),
            (&mut draft.podate, &self.podate),
            (&mut draft.notes, &self.notes),
        ];
        for (slot, value) in fields {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
        draft.visit |= self.visit;
        draft
    }
}

#[derive(Subcommand)]
pub enum ThemeAction {
    /// Print the current theme
    Show,
    /// Switch between light and dark
    Toggle,
    /// Set the theme explicitly
    Set { theme: Theme },
}

#[derive(Subcommand)]
pub enum DraftAction {
    /// Print the saved project draft
    Show,
    /// Discard the saved project draft
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.base_url {
        config.backend.base_url = url;
    }

    init_logging(&config.logging);

    match cli.command {
        Commands::List { filters, format } => {
            let layout = match format {
                OutputFormat::Table => Layout::Table,
                OutputFormat::Json => Layout::Json,
            };
            let (mut model, _) = build_model(&config, layout)?;
            ensure_loaded(model.fetch_and_render(filters.to_filters()).await)?;
        }

        Commands::Show { ticket } => {
            let (mut model, _) = build_model(&config, Layout::Silent)?;
            ensure_loaded(model.fetch_and_render(ListFilters::new()).await)?;

            match model.find(&ticket) {
                Some(t) => print_ticket(t),
                None => bail!("Ticket {} not found", ticket),
            }
        }

        Commands::Set { ticket, status } => {
            let (mut model, _) = build_model(&config, Layout::Silent)?;
            let outcome = model.quick_update(&ticket, Status::parse(&status)).await;
            if !outcome.is_ok() {
                bail!("Could not update {}", ticket);
            }
        }

        Commands::Bulk { status, tickets } => {
            let (mut model, _) = build_model(&config, Layout::Silent)?;
            let outcome = model.bulk_update(&tickets, Status::parse(&status)).await;
            if !outcome.failed.is_empty() {
                bail!(
                    "{} of {} updates failed: {}",
                    outcome.failed.len(),
                    outcome.requested,
                    outcome.failed.join(", ")
                );
            }
        }

        Commands::Edit {
            ticket,
            status,
            note,
            email,
            subject,
        } => {
            let (mut model, _) = build_model(&config, Layout::Silent)?;
            let status = match status {
                Some(s) => Status::parse(&s),
                None => {
                    ensure_loaded(model.fetch_and_render(ListFilters::new()).await)?;
                    match model.find(&ticket) {
                        Some(t) => t.status.clone(),
                        None => bail!("Ticket {} not found", ticket),
                    }
                }
            };

            let edit = TicketEdit {
                status,
                note,
                email_client: email,
                email_subject: subject,
            };
            if !model.save_edit(&ticket, edit).await.is_ok() {
                bail!("Could not save {}", ticket);
            }
        }

        Commands::Export { filters, output } => {
            let (mut model, _) = build_model(&config, Layout::Silent)?;
            ensure_loaded(model.fetch_and_render(filters.to_filters()).await)?;

            let csv = match model.export_csv() {
                Ok(csv) => csv,
                Err(ExportError::Empty) => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            let path = output.unwrap_or_else(|| {
                default_export_path(Path::new(&config.dashboard.export_dir), Local::now().date_naive())
            });
            write_csv(&csv, &path)?;
            println!("Exported {} tickets to {}", model.items().len(), path.display());
        }

        Commands::Watch { filters, interval } => {
            let (mut model, shell) = build_model(&config, Layout::Dashboard)?;
            ensure_loaded(model.fetch_and_render(filters.to_filters()).await)?;

            let period = Duration::from_secs(
                interval
                    .unwrap_or(config.dashboard.refresh_interval_secs)
                    .max(1),
            );
            let shared = model.into_shared();
            enable_auto_refresh(&shared, period).await;

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        if !shared.lock().await.is_auto_refresh_enabled() {
                            break;
                        }
                    }
                }
            }

            disable_auto_refresh(&shared).await;
            if let Some(location) = shell.navigated_to() {
                bail!("Session expired ({})", location);
            }
        }

        Commands::Submit { form } => {
            let client = FormClient::new(&config.backend.base_url, &config.forms.contact_email);
            let result = match form {
                SubmitForm::Contact {
                    name,
                    email,
                    message,
                } => {
                    client
                        .submit_contact(&ContactRequest {
                            name,
                            email,
                            message,
                        })
                        .await
                }
                SubmitForm::Quote {
                    name,
                    email,
                    phone,
                    ptype,
                    voltage,
                    when,
                    notes,
                } => {
                    client
                        .submit_quote(&QuoteRequest {
                            name,
                            email,
                            phone,
                            ptype,
                            voltage,
                            when,
                            notes,
                        })
                        .await
                }
                SubmitForm::Project(args) => submit_project(&config, &client, args).await,
            };

            if let Err(e) = result {
                return Err(report_form_error(e));
            }
        }

        Commands::Theme { action } => {
            let mut prefs = PrefsStore::open(&config.prefs.path);
            let theme = match action.unwrap_or(ThemeAction::Show) {
                ThemeAction::Show => prefs.theme(),
                ThemeAction::Toggle => prefs.toggle_theme()?,
                ThemeAction::Set { theme } => {
                    prefs.set_theme(theme)?;
                    theme
                }
            };
            println!("{}", theme);
        }

        Commands::Draft { action } => {
            let mut prefs = PrefsStore::open(&config.prefs.path);
            match action.unwrap_or(DraftAction::Show) {
                DraftAction::Show => match prefs.draft() {
                    Some(draft) => println!("{}", serde_json::to_string_pretty(draft)?),
                    None => println!("No saved draft"),
                },
                DraftAction::Clear => {
                    prefs.clear_draft()?;
                    println!("Draft cleared");
                }
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ticketdesk={}", config.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_model(
    config: &Config,
    layout: Layout,
) -> anyhow::Result<(TicketViewModel, Arc<ConsoleShell>)> {
    let shell = Arc::new(ConsoleShell::new(
        &config.backend.base_url,
        &config.backend.dashboard_path,
    ));
    let backend = HttpBackend::new(config.backend.clone()).context("Invalid backend settings")?;
    let model = TicketViewModel::new(
        Arc::new(backend),
        Box::new(TerminalView::stdout(layout)),
        shell.clone(),
    );
    Ok((model, shell))
}

fn ensure_loaded(outcome: FetchOutcome) -> anyhow::Result<()> {
    match outcome {
        FetchOutcome::Loaded(_) => Ok(()),
        FetchOutcome::Unauthorized => bail!("Not signed in"),
        FetchOutcome::Failed => bail!("Could not load tickets"),
    }
}

async fn submit_project(
    config: &Config,
    client: &FormClient,
    args: ProjectArgs,
) -> Result<(), FormError> {
    let mut prefs = PrefsStore::open(&config.prefs.path);
    let fields = args.merge_into(prefs.draft().cloned().unwrap_or_default());

    if args.save_only {
        if let Err(e) = prefs.save_draft(fields) {
            tracing::warn!(error = %e, "Could not save project draft");
        }
        println!("Draft saved");
        return Ok(());
    }

    let result = client
        .submit_project(ProjectRequest {
            fields: fields.clone(),
            files: args.files,
        })
        .await;

    // Keep the draft for a retry unless the submission went through
    let saved = match &result {
        Ok(()) => prefs.clear_draft(),
        Err(_) => prefs.save_draft(fields),
    };
    if let Err(e) = saved {
        tracing::warn!(error = %e, "Could not update project draft");
    }
    result
}

fn report_form_error(error: FormError) -> anyhow::Error {
    if let Some(fallback) = error.fallback() {
        eprintln!("You can also reach us at {}", fallback);
    }
    error.into()
}

fn print_ticket(t: &Ticket) {
    println!("{}  [{}]  {}", t.ticket, t.status.label(), t.kind);
    let overdue = if t.overdue { "  OVERDUE" } else { "" };
    println!(
        "Created: {}  Age: {}{}",
        t.created_at.format("%Y-%m-%d %H:%M UTC"),
        format_age(t.age_hours),
        overdue
    );
    println!();

    for (label, value) in [("Name", &t.name), ("Email", &t.email), ("Phone", &t.phone)] {
        if !value.is_empty() {
            println!("{:<8} {}", label, value);
        }
    }

    if !t.fields.is_empty() {
        println!();
        println!("Submission:");
        for (key, value) in &t.fields {
            println!("  {:<24} {}", key, value);
        }
    }

    if !t.attachments.is_empty() {
        println!();
        println!("Attachments:");
        for name in &t.attachments {
            println!("  {}", name);
        }
    }

    if !t.note.is_empty() {
        println!();
        println!("Note: {}", t.note);
    }

    if !t.history.is_empty() {
        println!();
        println!("History:");
        for entry in t.history_newest_first() {
            let email = if entry.email_sent { "  (emailed)" } else { "" };
            println!(
                "  {}  {:<8} {:<9} {}{}",
                entry.timestamp, entry.actor, entry.status, entry.note, email
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_project_args_overlay_draft() {
        let cli = Cli::parse_from([
            "ticketdesk",
            "submit",
            "project",
            "--name",
            "Lee",
            "--visit",
            "--file",
            "plan.pdf",
        ]);
        let Commands::Submit {
            form: SubmitForm::Project(args),
        } = cli.command
        else {
            panic!("expected project submission");
        };

        let draft = ProjectDraft {
            org: "Grid Works".into(),
            name: "Old".into(),
            ..Default::default()
        };
        let merged = args.merge_into(draft);
        assert_eq!(merged.org, "Grid Works");
        assert_eq!(merged.name, "Lee");
        assert!(merged.visit);
        assert_eq!(args.files, vec![PathBuf::from("plan.pdf")]);
    }

    #[test]
    fn test_filters_from_args() {
        let cli = Cli::parse_from(["ticketdesk", "list", "-q", " acme ", "-s", "wip", "-f", "json"]);
        let Commands::List { filters, .. } = cli.command else {
            panic!("expected list");
        };
        let filters = filters.to_filters();
        assert_eq!(filters.q, "acme");
        assert_eq!(filters.status, "wip");
        assert!(filters.kind.is_empty());
    }
}
