use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::sync::Arc;

use savdhaan_client::api::client::OAuthProvider;
use savdhaan_client::risk::RiskColor;
use savdhaan_client::view::{CardPage, PageMetadata, ScanView};
use savdhaan_client::{flows, settings, ApiClient};

const RESET: &str = "\x1b[0m";

#[derive(Parser, Debug)]
#[command(name = "savdhaan", version, about = "Check suspicious messages with Savdhaan AI")]
struct Cli {
    #[arg(long, global = true, help = "API base URL (overrides settings and SAVDHAAN_API_URL)")]
    api_url: Option<String>,
    #[arg(long, global = true, help = "API key for scan endpoints")]
    api_key: Option<String>,
    #[arg(long, global = true, help = "Print metadata as JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a message. Use `-` to read it from stdin.
    Scan { content: String },
    /// Show an earlier scan
    ScanGet { scan_id: String },
    /// Show a public scam card
    Card { card_id: String },
    /// Link-preview metadata for a card
    CardMeta { card_id: String },
    Login { email: String, password: String },
    Register {
        email: String,
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    Refresh,
    Logout,
    /// Save the scan API key to the settings file. Omit the key to forget it.
    SetApiKey { key: Option<String> },
    /// Print the social sign-in URL
    Oauth {
        #[arg(value_enum)]
        provider: Provider,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Provider {
    Google,
    Github,
}

impl From<Provider> for OAuthProvider {
    fn from(p: Provider) -> Self {
        match p {
            Provider::Google => OAuthProvider::Google,
            Provider::Github => OAuthProvider::Github,
        }
    }
}

fn paint(color: RiskColor, text: &str) -> String {
    format!("{}{}{}", color.ansi(), text, RESET)
}

fn print_scan(view: &ScanView) {
    println!(
        "Risk Assessment  {}",
        paint(view.level.color(), &format!("[{}]", view.badge.label()))
    );
    if let Some(label) = &view.scam_type_label {
        println!("Type: {}", label);
    }
    println!("{}", paint(view.meter.color, &view.meter.render_bar(30)));
    println!("Needle: {:.1} deg", view.meter.angle);
    println!();
    println!("What we found");
    println!("  {}", view.explanation);

    if !view.evidence.is_empty() {
        println!();
        println!("Evidence");
        for e in &view.evidence {
            let marker = if e.is_threat { "!" } else { "-" };
            println!("  {} {}: {}", marker, e.source, e.detail);
        }
    }

    if !view.actions.is_empty() {
        println!();
        println!("Recommended Actions");
        for action in &view.actions {
            println!("  > {}", action);
        }
    }

    if !view.confidence_note.is_empty() {
        println!();
        println!("{}", view.confidence_note);
    }

    if let (Some(path), Some(link)) = (view.card_path(), view.share_link()) {
        println!();
        println!("Scam card: {}", path);
        println!("Share link: {}", link);
    }

    println!();
    println!(
        "Scan ID: {} | Analyzed in {}ms",
        view.scan_id, view.processing_time_ms
    );
}

fn print_card(page: &CardPage) {
    match page {
        CardPage::Found(card) => {
            println!("{}  {}", paint(card.level.color(), &format!("[{}]", card.badge.label())), card.title);
            println!("Risk Score: {}/100", card.risk_score);
            println!();
            println!("{}", card.summary);
            if let Some(label) = &card.scam_type_label {
                println!();
                println!("Scam type: {}", label);
            }
            println!();
            println!("{}  |  {}", card.created_label, card.views_label);
            println!("{}", card.card_url);
        }
        CardPage::NotFound => {
            println!("{}", CardPage::NOT_FOUND_HEADING);
            println!("{}", CardPage::NOT_FOUND_DETAIL);
        }
    }
}

fn print_metadata(meta: &PageMetadata, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(meta)?);
    } else {
        println!("title: {}", meta.title);
        println!("description: {}", meta.description);
        if let Some(og) = &meta.open_graph {
            println!("og:site_name: {}", og.site_name);
            println!("og:type: {}", og.kind);
            for image in &og.images {
                println!("og:image: {}", image);
            }
        }
    }
    Ok(())
}

fn read_content(arg: String) -> anyhow::Result<String> {
    if arg != "-" {
        return Ok(arg);
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading message from stdin")?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    savdhaan_client::init_logging();
    let cli = Cli::parse();

    let mut settings = settings::load_settings()
        .unwrap_or_else(|e| {
            log::warn!("Could not load settings, using defaults: {}", e);
            settings::ClientSettings::default()
        })
        .with_env_overrides();
    if let Some(url) = cli.api_url {
        settings.api_base_url = url;
    }
    if let Some(key) = cli.api_key {
        settings.api_key = Some(key);
    }

    let tokens = Arc::new(settings.token_store());
    let client = ApiClient::new(&settings, tokens).context("building HTTP client")?;
    let api_key = settings.api_key.as_deref();

    let outcome: Result<(), String> = match cli.command {
        Commands::Scan { content } => {
            let content = read_content(content)?;
            flows::submit_scan(&client, &content, api_key)
                .await
                .map(|view| print_scan(&view))
        }
        Commands::ScanGet { scan_id } => flows::fetch_scan(&client, &scan_id, api_key)
            .await
            .map(|view| print_scan(&view)),
        Commands::Card { card_id } => {
            print_card(&flows::load_card(&client, &card_id).await);
            Ok(())
        }
        Commands::CardMeta { card_id } => {
            let meta = flows::card_metadata(&client, &card_id).await;
            print_metadata(&meta, cli.json)?;
            Ok(())
        }
        Commands::Login { email, password } => flows::login(&client, &email, &password)
            .await
            .map(|()| println!("Signed in.")),
        Commands::Register {
            email,
            password,
            name,
        } => flows::register(&client, &email, &password, name.as_deref())
            .await
            .map(|()| println!("Account created.")),
        Commands::Refresh => flows::refresh_session(&client)
            .await
            .map(|()| println!("Session refreshed.")),
        Commands::Logout => flows::logout(&client).map(|()| println!("Signed out.")),
        Commands::SetApiKey { key } => {
            let saved = settings::remember_api_key(key.as_deref()).context("saving settings")?;
            if saved.api_key.is_some() {
                println!("API key saved.");
            } else {
                println!("API key removed.");
            }
            Ok(())
        }
        Commands::Oauth { provider } => {
            println!("{}", client.oauth_url(provider.into()));
            Ok(())
        }
    };

    if let Err(message) = outcome {
        bail!(message);
    }
    Ok(())
}
