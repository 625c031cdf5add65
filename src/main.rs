use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use magipaper::content::{Article, ArticleId, ArticleStore, Category};
use magipaper::filter::{FeedView, FilterPipeline};
use magipaper::onboarding::OnboardingFlow;
use magipaper::preferences::{PreferenceState, ReadingTime};
use magipaper::profile::{reading_time_label, ArticleDetail, ProfileSummary};
use magipaper::storage::{Database, DatabaseError};
use magipaper::util::truncate_to_width;
use magipaper::Config;

const TITLE_WIDTH: usize = 56;

/// Get the config directory path (~/.config/magipaper/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("magipaper"))
}

fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if config_dir.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;

    // User-only access: the directory holds the preference database.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(config_dir, std::fs::Permissions::from_mode(0o700))
        {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "magipaper", about = "Personalized article reader")]
struct Args {
    /// Config file (default: ~/.config/magipaper/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Preference database (overrides the config file)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the feed, filtered by your interests
    Feed {
        /// Free-text search over title, summary, author and tags
        #[arg(long)]
        search: Option<String>,

        /// Show one category instead of your interests
        #[arg(long, value_name = "NAME")]
        category: Option<Category>,

        /// Only favorite articles
        #[arg(long)]
        favorites: bool,
    },

    /// Show one article with related articles
    Show { id: ArticleId },

    /// Toggle an article's favorite status
    Favorite { id: ArticleId },

    /// Show interest categories, or replace them with the given list
    Categories {
        #[arg(value_name = "NAME")]
        names: Vec<Category>,

        /// Remove every interest (no category restriction)
        #[arg(long, conflicts_with = "names")]
        clear: bool,
    },

    /// Set the preferred reading time (morning, afternoon, evening, anytime)
    ReadingTime { value: ReadingTime },

    /// Answer the first-run questions
    Onboard {
        #[arg(long)]
        name: String,

        /// Interest category; repeat for several
        #[arg(long = "category", value_name = "NAME", required = true)]
        categories: Vec<Category>,

        #[arg(long, default_value = "anytime")]
        reading_time: ReadingTime,
    },

    /// Favorites and reading statistics
    Profile,

    /// Restore all preferences to their defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.database_path(&config_dir));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of magipaper appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    let prefs = PreferenceState::load(db)
        .await
        .context("Failed to load preferences")?;

    match args.command {
        Command::Feed {
            search,
            category,
            favorites,
        } => {
            let store = load_store(&config).await;
            let pipeline = FilterPipeline::attach(&store, &prefs, config.search_debounce());
            pipeline.select_category(category).await;
            pipeline.set_favorites_only(favorites).await;
            if let Some(text) = search {
                pipeline.submit_search(text).await;
            }
            print_feed(&pipeline.settled_view().await, &prefs);
        }

        Command::Show { id } => {
            let store = load_store(&config).await;
            let detail =
                ArticleDetail::build(id, &store.all(), &prefs.snapshot(), config.related_limit)
                    .ok_or_else(|| anyhow::anyhow!("No article with id {id}"))?;
            print_detail(&detail);
        }

        Command::Favorite { id } => {
            let store = load_store(&config).await;
            if store.get_by_id(id).is_none() {
                tracing::warn!(article_id = id, "Favoriting an id with no matching article");
            }
            let now_favorite = prefs
                .toggle_favorite(id)
                .await
                .context("Failed to update favorites")?;
            if now_favorite {
                println!("Added article {id} to favorites");
            } else {
                println!("Removed article {id} from favorites");
            }
        }

        Command::Categories { names, clear } => {
            if clear {
                prefs
                    .set_selected_categories(BTreeSet::new())
                    .await
                    .context("Failed to update categories")?;
            } else if !names.is_empty() {
                prefs
                    .set_selected_categories(names.into_iter().collect())
                    .await
                    .context("Failed to update categories")?;
            }
            let selected = prefs.selected_categories();
            for category in Category::ALL {
                let mark = if selected.contains(&category) { "x" } else { " " };
                println!("[{mark}] {category}");
            }
            if selected.is_empty() {
                println!("No interests selected: the feed shows every category.");
            }
        }

        Command::ReadingTime { value } => {
            prefs
                .set_reading_time(value)
                .await
                .context("Failed to update reading time")?;
            println!("Reading time: {}", value.display_name());
        }

        Command::Onboard {
            name,
            categories,
            reading_time,
        } => {
            let flow = OnboardingFlow::from_answers(name, categories, reading_time);
            flow.complete(&prefs).await.with_context(|| {
                format!("Onboarding failed at \"{}\"", flow.step().title())
            })?;
            let interests: Vec<&str> =
                flow.categories().iter().map(|c| c.display_name()).collect();
            println!("Welcome, {}!", flow.name().trim());
            println!("Interests: {}", interests.join(", "));
        }

        Command::Profile => {
            let store = load_store(&config).await;
            let snapshot = prefs.snapshot();
            print_profile(&ProfileSummary::build(&store.all(), &snapshot), snapshot.reading_time);
        }

        Command::Reset => {
            prefs.reset().await.context("Failed to reset preferences")?;
            println!("Preferences reset.");
        }
    }

    Ok(())
}

/// Build the store over the sample source and wait for the first load.
async fn load_store(config: &Config) -> ArticleStore {
    let store = ArticleStore::with_sample(config.load_latency());
    store.load().await;
    if let Some(message) = store.error_message() {
        eprintln!("Warning: {message}");
    }
    store
}

fn print_feed(view: &FeedView, prefs: &PreferenceState) {
    if let Some(message) = &view.error_message {
        eprintln!("Warning: {message}");
    }
    if view.articles.is_empty() {
        println!("No articles match.");
        return;
    }
    for article in view.articles.iter() {
        print_row(article, prefs.is_favorite(article.id));
    }
}

fn print_row(article: &Article, favorite: bool) {
    let star = if favorite { "*" } else { " " };
    println!(
        "{star} {:>3}  {:<13}  {:<width$}  {}",
        article.id,
        article.category.display_name(),
        truncate_to_width(&article.title, TITLE_WIDTH),
        article.published_at.format("%b %-d, %Y"),
        width = TITLE_WIDTH,
    );
}

fn print_detail(detail: &ArticleDetail) {
    let article = &detail.article;
    println!("{}", article.title);
    println!(
        "{} | {} | {} | {}{}",
        article.category,
        article.author,
        detail.published_label(),
        detail.reading_time_label(),
        if detail.is_favorite { " | favorite" } else { "" }
    );
    println!("Source: {}", article.source);
    if !article.tags.is_empty() {
        println!("Tags: {}", article.tags.join(", "));
    }
    println!();
    println!("{}", article.content);

    if !detail.related.is_empty() {
        println!();
        println!("Related:");
        for related in &detail.related {
            print_row(related, false);
        }
    }
}

fn print_profile(summary: &ProfileSummary, reading_time: ReadingTime) {
    let name = if summary.display_name.is_empty() {
        "Reader"
    } else {
        summary.display_name.as_str()
    };
    println!("{name}");
    println!("Reading time: {}", reading_time.display_name());
    println!(
        "Favorites: {} ({} total)",
        summary.favorite_count(),
        reading_time_label(summary.total_reading_minutes)
    );
    for (category, count) in &summary.category_stats {
        println!("  {category}: {count}");
    }
    for article in &summary.favorites {
        print_row(article, true);
    }
}
