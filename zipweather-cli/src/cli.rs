use std::{io::Write, sync::Arc};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;
use zipweather_core::{
    Clock, ClockTicker, Config, LookupState, Sequencing, SystemClock, TimeDisplay, WeatherLookup,
    WeatherPanel,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "zipweather", version, about = "Clock and weather by Japanese postal code")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit endpoints, sequencing and clock settings.
    Configure,

    /// Look up the forecast for one postal code and print it.
    Show {
        /// Seven-digit postal code; separators such as '-' are ignored.
        postal_code: String,
    },

    /// Keep a live clock running and read postal codes from stdin, one per line.
    Watch {
        /// Postal code to look up on start.
        #[arg(long)]
        postal: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { postal_code } => show(&postal_code).await,
            Command::Watch { postal } => watch(postal.as_deref()).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    cfg.endpoints.postal_base_url = Text::new("Postal lookup base URL:")
        .with_default(&cfg.endpoints.postal_base_url)
        .prompt()?;
    cfg.endpoints.forecast_base_url = Text::new("Forecast base URL:")
        .with_default(&cfg.endpoints.forecast_base_url)
        .prompt()?;

    let timeout = Text::new("Request timeout in seconds (empty for none):")
        .with_default(&cfg.timeout_secs.map(|t| t.to_string()).unwrap_or_default())
        .prompt()?;
    cfg.timeout_secs = match timeout.trim() {
        "" => None,
        secs => Some(secs.parse().with_context(|| format!("Invalid timeout: {secs}"))?),
    };

    let options = Sequencing::all().to_vec();
    let cursor = options.iter().position(|s| *s == cfg.sequencing).unwrap_or_default();
    cfg.sequencing = Select::new("When lookups overlap, keep:", options)
        .with_starting_cursor(cursor)
        .with_help_message("last_write: last to finish wins; latest_request: last typed wins")
        .prompt()?;

    cfg.clear_on_empty_result = Confirm::new("Clear weather when a postal code has no address?")
        .with_default(cfg.clear_on_empty_result)
        .prompt()?;

    cfg.clock.utc_offset_minutes = CustomType::<i32>::new("Clock UTC offset in minutes:")
        .with_default(cfg.clock.utc_offset_minutes)
        .prompt()?;
    cfg.clock.offset()?;

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(raw: &str) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let lookup = WeatherLookup::from_config(&cfg)?;

    let Some(chain) = lookup.on_postal_code_input(raw) else {
        bail!("'{raw}' is not a 7-digit postal code");
    };
    chain.await.context("Lookup task failed")?;
    debug!(state = ?lookup.state(), "lookup finished");

    let clock = SystemClock::new(cfg.clock.offset()?);
    let now = TimeDisplay::at(&clock.now());
    println!("{}", render(&now, &lookup.state()));
    Ok(())
}

async fn watch(initial: Option<&str>) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let lookup = WeatherLookup::from_config(&cfg)?;
    let clock = Arc::new(SystemClock::new(cfg.clock.offset()?));
    let ticker = ClockTicker::start(clock, cfg.clock.tick());

    if let Some(raw) = initial {
        lookup.on_postal_code_input(raw);
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let shutdown = async {
        // A failure to install the handler only means Ctrl-C cannot stop the loop.
        let _ = tokio::signal::ctrl_c().await;
    };
    run_watch(&lookup, &ticker, stdin, &mut std::io::stdout(), shutdown).await
}

/// Redraw on every clock or lookup change and feed input lines to the lookup
/// until `shutdown` completes.
async fn run_watch<R, W>(
    lookup: &WeatherLookup,
    ticker: &ClockTicker,
    input: R,
    out: &mut W,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut clock_rx = ticker.subscribe();
    let mut state_rx = lookup.subscribe();
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    let mut stdin_open = true;
    let mut last = String::new();
    loop {
        let line = render(&ticker.display(), &state_rx.borrow_and_update());
        if line != last {
            writeln!(out, "{line}")?;
            last = line;
        }

        tokio::select! {
            _ = &mut shutdown => break,
            changed = clock_rx.changed() => changed.context("Clock stopped")?,
            changed = state_rx.changed() => changed.context("Lookup state closed")?,
            input = lines.next_line(), if stdin_open => match input? {
                Some(raw) => {
                    debug!(input = %raw, "postal code input");
                    lookup.on_postal_code_input(&raw);
                }
                None => stdin_open = false,
            },
        }
    }

    Ok(())
}

fn render(now: &TimeDisplay, state: &LookupState) -> String {
    let postal = if state.postal_code.is_empty() { "-------" } else { &state.postal_code };
    format!("{} {} | 〒{} | {}", now.time, now.date, postal, WeatherPanel::from_state(state))
}
