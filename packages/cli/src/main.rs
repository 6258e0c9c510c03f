//! Terminal front-end for the blog.
//!
//! Wires `blog.toml` + file-backed session storage + the HTTP API into the
//! client core and renders its state and notifications as text.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use api::{Credentials, HttpApi, PostDraft, Registration};
use clap::{Parser, Subcommand};
use client::{
    auth, protect, LoginRedirect, Navigation, NotificationLevel, Notifier, PostDetail, PostFeed,
    RouteAccess, SessionStore,
};
use store::{ClientConfig, FileStore, Identity, Post};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blog")]
#[command(about = "Read and write posts on a blog server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to ./blog.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Where the session is kept
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show the logged-in user
    Whoami,
    Login {
        email: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
        /// The password again
        confirm_password: String,
    },
    Logout,
    /// List posts, one page at a time
    Posts {
        #[arg(default_value_t = 1)]
        page: usize,
    },
    /// Show a post with its comments
    Show { id: String },
    /// Like or unlike a post
    Like { id: String },
    Comment { id: String, text: String },
    /// Delete one of your comments
    Uncomment { post_id: String, comment_id: String },
    Create { title: String, content: String },
    Edit {
        id: String,
        title: String,
        content: String,
    },
    /// Delete one of your posts
    Delete { id: String },
}

impl Command {
    fn is_protected(&self) -> bool {
        matches!(
            self,
            Self::Comment { .. }
                | Self::Uncomment { .. }
                | Self::Create { .. }
                | Self::Edit { .. }
                | Self::Delete { .. }
        )
    }
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(ClientConfig::filename()));
    let config = match std::fs::read_to_string(&path) {
        Ok(text) => ClientConfig::from_toml(&text)
            .with_context(|| format!("invalid config {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config at {}, using defaults", path.display());
            ClientConfig::default()
        }
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    Ok(config.with_env_overrides())
}

struct App {
    config: ClientConfig,
    api: HttpApi,
    session: SessionStore<FileStore>,
    notifier: Notifier,
}

impl App {
    fn feed(&self) -> PostFeed<HttpApi> {
        PostFeed::new(self.api.clone(), self.session.handle(), self.notifier.clone())
            .with_config(&self.config.feed)
    }

    async fn detail(&self, post_id: &str) -> Result<PostDetail<HttpApi>> {
        let detail = PostDetail::new(
            self.api.clone(),
            self.session.handle(),
            self.notifier.clone(),
            post_id,
        );
        detail.load().await?;
        Ok(detail)
    }

    fn require_login(&self) -> Result<Identity> {
        match protect(&self.session.snapshot()) {
            RouteAccess::Allowed(identity) => Ok(identity),
            RouteAccess::Redirect(Navigation::Login) => {
                bail!("not logged in; run `blog login <email> <password>` first")
            }
            RouteAccess::Pending => bail!("session is not initialized"),
        }
    }

    async fn run(&self, command: Command) -> Result<()> {
        if command.is_protected() {
            self.require_login()?;
        }
        match command {
            Command::Whoami => match self.session.current_identity() {
                Some(identity) => println!("{} <{}>", identity.username, identity.email),
                None => println!("not logged in"),
            },
            Command::Login { email, password } => {
                let credentials = Credentials { email, password };
                let identity =
                    auth::login(&self.api, &self.session, &self.notifier, &credentials).await?;
                println!("logged in as {}", identity.username);
            }
            Command::Register {
                username,
                email,
                password,
                confirm_password,
            } => {
                let registration = Registration {
                    username,
                    email,
                    password,
                };
                let identity = auth::register(
                    &self.api,
                    &self.session,
                    &self.notifier,
                    &registration,
                    &confirm_password,
                )
                .await?;
                println!("registered as {}", identity.username);
            }
            Command::Logout => self.session.logout().await,
            Command::Posts { page } => {
                let feed = self.feed();
                feed.load().await?;
                let viewer = self.session.current_identity();
                let posts = feed.page(page);
                if posts.is_empty() {
                    println!("no posts");
                }
                for post in &posts {
                    print_summary(post, viewer.as_ref());
                }
                println!("page {} of {}", page.max(1), feed.page_count().max(1));
            }
            Command::Show { id } => {
                let detail = self.detail(&id).await?;
                if let Some(post) = detail.post() {
                    print_post(&post, self.session.current_identity().as_ref());
                }
            }
            Command::Like { id } => {
                let detail = self.detail(&id).await?;
                detail.toggle_like().await?;
                if let Some(post) = detail.post() {
                    println!("{} like(s)", post.like_count());
                }
            }
            Command::Comment { id, text } => {
                let detail = self.detail(&id).await?;
                let comment = detail.add_comment(&text).await?;
                println!("comment {}", comment.id);
            }
            Command::Uncomment {
                post_id,
                comment_id,
            } => {
                let detail = self.detail(&post_id).await?;
                detail.delete_comment(&comment_id).await?;
            }
            Command::Create { title, content } => {
                let post = self.feed().create_post(&PostDraft::new(title, content)).await?;
                println!("post {}", post.id);
            }
            Command::Edit { id, title, content } => {
                let detail = self.detail(&id).await?;
                detail.update_post(&PostDraft::new(title, content)).await?;
            }
            Command::Delete { id } => {
                let detail = self.detail(&id).await?;
                detail.delete_post().await?;
            }
        }
        Ok(())
    }
}

fn print_summary(post: &Post, viewer: Option<&Identity>) {
    let liked = viewer.is_some_and(|v| post.is_liked_by(&v.id));
    println!(
        "{}  {}  by {}  [{}{} like(s), {} comment(s)]",
        post.id,
        post.title,
        post.author.username,
        if liked { "♥ " } else { "" },
        post.like_count(),
        post.comments.len()
    );
}

fn print_post(post: &Post, viewer: Option<&Identity>) {
    println!("{}", post.title);
    println!("by {} on {}", post.author.username, post.created_at);
    println!();
    println!("{}", post.content);
    println!();
    print_summary(post, viewer);
    for comment in &post.comments {
        let own = viewer.is_some_and(|v| comment.is_authored_by(&v.id));
        println!(
            "  {} {}: {}{}",
            comment.id,
            comment.author.username,
            comment.content,
            if own { " (yours)" } else { "" }
        );
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!("Using API at {}", config.api.base_url);
    let api = HttpApi::from_config(&config.api)?;
    let storage = FileStore::new(cli.data_dir.unwrap_or_else(FileStore::default_dir));
    let session = SessionStore::new(storage);
    let mut redirect = LoginRedirect::new(session.subscribe());
    session.initialize().await;
    // The startup resolution is not a navigation event for a one-shot command.
    redirect.poll();

    let app = App {
        notifier: Notifier::from_config(&config.notifications),
        config,
        api,
        session,
    };
    let outcome = app.run(cli.command).await;

    let notices = app.notifier.drain();
    for notice in &notices {
        match notice.level {
            NotificationLevel::Error => eprintln!("! {}", notice.message),
            _ => println!("* {}", notice.message),
        }
    }
    if redirect.poll() == Some(Navigation::Login) {
        println!("signed out; run `blog login <email> <password>` to sign in");
    }

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            if !notices.iter().any(|n| n.level == NotificationLevel::Error) {
                eprintln!("error: {e:#}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
