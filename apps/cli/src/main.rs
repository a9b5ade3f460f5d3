use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Local;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use insighttrack_core::{
    Config, HttpBackend, InsightPanel, InsightRequester, Page, Provider, Session, StatsMemo,
    Storefront, StorefrontError, TimelineOrder, format_dashboard, format_event_log,
    storefront::{FEATURED_PRODUCT, UNIT_PRICE},
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::Command;

mod commands;
mod logging;

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, ValueEnum)]
enum CliProvider {
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CliTimelineOrder {
    Lexicographic,
    Chronological,
}

impl From<CliTimelineOrder> for TimelineOrder {
    fn from(cli: CliTimelineOrder) -> Self {
        match cli {
            CliTimelineOrder::Lexicographic => TimelineOrder::Lexicographic,
            CliTimelineOrder::Chronological => TimelineOrder::Chronological,
        }
    }
}

#[derive(Parser)]
#[command(name = "insighttrack")]
#[command(
    about = "Simulate a storefront, track interaction events and generate AI-powered insight reports"
)]
struct Cli {
    /// AI provider for insight reports (defaults to INSIGHTTRACK_PROVIDER or gemini)
    #[arg(short, long)]
    provider: Option<CliProvider>,

    /// Ordering of the activity timeline buckets
    #[arg(short, long)]
    timeline_order: Option<CliTimelineOrder>,

    /// Log level (overridden by RUST_LOG)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Replay a sample shopping journey and print the results instead of
    /// starting the interactive prompt
    #[arg(short, long)]
    demo: bool,

    /// With --demo, also request an insight report
    #[arg(short, long, requires = "demo")]
    insight: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

struct App {
    session: Session,
    store: Storefront,
    memo: StatsMemo,
    panel: InsightPanel,
    requester: InsightRequester<HttpBackend>,
    provider: Provider,
    timeline_order: TimelineOrder,
}

impl App {
    fn new(config: &Config) -> Self {
        let mut session = Session::new();
        let store = Storefront::open(&mut session);
        Self {
            session,
            store,
            memo: StatsMemo::new(),
            panel: InsightPanel::new(),
            requester: InsightRequester::for_provider(config.provider, config.api_key.clone()),
            provider: config.provider,
            timeline_order: config.timeline_order,
        }
    }

    fn print_location(&self) {
        println!(
            "{} shop-demo.local/{}  {}",
            style("→").cyan().bold(),
            self.store.page().name().to_lowercase(),
            style(format!("cart: {}", self.store.cart_count())).dim()
        );
    }

    fn print_log(&self) {
        println!(
            "\n{}  {}\n",
            style("Live Event Stream").cyan().bold(),
            style(format!("{} events", self.session.len())).dim()
        );
        print!("{}", format_event_log(self.session.events(), &Local));
    }

    fn print_stats(&mut self) {
        let stats = self.memo.get(&self.session, self.timeline_order);
        println!("\n{}\n", style("Analytics").cyan().bold());
        print!("{}", format_dashboard(stats));
    }

    async fn generate_insight(&mut self) {
        if !self.panel.can_generate(self.session.len()) {
            println!(
                "{} Generate some events in the sandbox first.",
                style("!").yellow().bold()
            );
            return;
        }

        let start = Instant::now();
        let spinner = create_spinner(&format!("Analyzing with {}...", self.provider.name()));
        let text = self
            .panel
            .generate(&self.requester, self.session.events())
            .await
            .to_string();
        spinner.finish_with_message(format!(
            "{} Report generated ({}) {}",
            style("✓").green().bold(),
            self.provider.name(),
            style(format!("[{}]", format_duration(start.elapsed()))).dim()
        ));

        println!("{}", style("─".repeat(60)).dim());
        println!("{}", text);
        println!("{}", style("─".repeat(60)).dim());
        println!(
            "{}",
            style(format!(
                "Powered by {} ({})",
                self.provider.name(),
                self.requester.model()
            ))
            .dim()
        );
    }

    fn purchase(&mut self) {
        match self.store.purchase(&mut self.session) {
            Ok(receipt) => println!(
                "{} Purchase simulated: {} item(s), ${:.2}. Event tracked.",
                style("✓").green().bold(),
                receipt.items,
                receipt.value
            ),
            Err(StorefrontError::EmptyCart) => println!(
                "{} {}",
                style("Alert:").red().bold(),
                StorefrontError::EmptyCart
            ),
        }
    }

    /// Apply one command. Returns `false` when the user asked to quit.
    async fn handle(&mut self, command: Command) -> bool {
        let session = &mut self.session;
        match command {
            Command::Home => self.store.navigate(session, Page::Home),
            Command::Products | Command::Back => self.store.navigate(session, Page::Products),
            Command::Hero => self.store.click_hero(session),
            Command::Collection(n) => self.store.click_featured_collection(session, n),
            Command::View(product) => self.store.view_product(session, &product),
            Command::Add(product) => {
                let product = product.unwrap_or_else(|| FEATURED_PRODUCT.to_string());
                self.store.add_to_cart(session, &product, UNIT_PRICE);
                println!(
                    "{} Added {} to cart",
                    style("✓").green().bold(),
                    style(&product).yellow()
                );
            }
            Command::Wishlist => self.store.add_to_wishlist(session, FEATURED_PRODUCT),
            Command::Related(id) => self.store.click_related_product(session, id),
            Command::Cart => self.store.open_cart(session),
            Command::Checkout => self.store.start_checkout(session),
            Command::Pay => self.purchase(),
            Command::Log => {
                self.print_log();
                return true;
            }
            Command::Stats => {
                self.print_stats();
                return true;
            }
            Command::Clear => {
                session.clear();
                println!("{} Events cleared", style("✓").green().bold());
                return true;
            }
            Command::Insight => {
                self.generate_insight().await;
                return true;
            }
            Command::Help => {
                println!("{}", commands::HELP);
                return true;
            }
            Command::Quit => return false,
        }

        self.print_location();
        true
    }
}

async fn run_demo(app: &mut App, with_insight: bool) {
    for command in [
        Command::Hero,
        Command::View(FEATURED_PRODUCT.to_string()),
        Command::Add(None),
        Command::Cart,
        Command::Checkout,
        Command::Pay,
    ] {
        app.handle(command).await;
    }

    app.print_log();
    app.print_stats();

    if with_insight {
        app.generate_insight().await;
    }
}

async fn run_interactive(app: &mut App) -> Result<()> {
    println!("{}\n", style("Type 'help' for commands.").dim());
    app.print_location();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(">").cyan().bold());
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match commands::parse(&line) {
            Ok(Some(command)) => {
                if !app.handle(command).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("{} {}", style("Error:").red().bold(), e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(provider) = cli.provider {
        config = config.with_provider(provider.into());
    }
    if let Some(order) = cli.timeline_order {
        config.timeline_order = order.into();
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    logging::init_tracing(&config.log_level)?;
    config.log_config();

    // A missing key only surfaces once a report is requested.
    if config.api_key.is_none() {
        tracing::warn!(
            env_var = config.provider.config().env_var,
            "No API key configured; insight reports will fail"
        );
    }

    println!(
        "\n{}  {}\n",
        style("insighttrack").cyan().bold(),
        style("Behavioral Analytics & Event Simulation").dim()
    );

    let mut app = App::new(&config);

    if cli.demo {
        run_demo(&mut app, cli.insight).await;
    } else {
        run_interactive(&mut app).await?;
    }

    tracing::info!(
        session_id = app.session.session_id(),
        events = app.session.len(),
        "Session ended"
    );

    Ok(())
}
