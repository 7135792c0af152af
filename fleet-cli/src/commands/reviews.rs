//! Review inspection commands

use clap::{Args, Subcommand};
use fleet_core::{Config, ReviewService, ServerConfig};
use fleet_store::{CommentThread, Review, ReviewStore};

/// Inspect stored reviews
#[derive(Args, Debug)]
pub struct ReviewsArgs {
    #[command(subcommand)]
    pub command: ReviewsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReviewsCommand {
    /// List reviews, newest first
    List {
        /// Only show reviews in this status (pending_review, changes_requested, approved)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show a review with its comment threads
    Show {
        /// Review ID
        id: String,
    },
}

impl ReviewsArgs {
    /// Execute the reviews command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = ReviewStore::new(config.storage.reviews_dir());
        let service = ReviewService::new(store, ServerConfig::base_url(config.server.port));

        match &self.command {
            ReviewsCommand::List { status } => list_reviews(&service, status.as_deref()).await,
            ReviewsCommand::Show { id } => show_review(&service, id).await,
        }
    }
}

async fn list_reviews(service: &ReviewService, status: Option<&str>) -> anyhow::Result<()> {
    let reviews: Vec<Review> = service
        .list_reviews()
        .await?
        .into_iter()
        .filter(|r| status.map_or(true, |s| r.status.as_str() == s))
        .collect();

    if reviews.is_empty() {
        println!("No reviews.");
        return Ok(());
    }

    println!(
        "{:<16} {:<18} {:>5}  {:<17} DOCUMENT",
        "ID", "STATUS", "ROUND", "UPDATED"
    );
    for review in &reviews {
        println!(
            "{:<16} {:<18} {:>5}  {:<17} {}",
            review.id,
            review.status.as_str(),
            review.current_round,
            review.updated_at.format("%Y-%m-%d %H:%M"),
            review.document_path
        );
    }

    Ok(())
}

async fn show_review(service: &ReviewService, id: &str) -> anyhow::Result<()> {
    let review = service.get_review(id).await?;
    let threads = service.list_threads(id).await?;

    println!("Review {}", review.id);
    println!("  document: {}", review.document_path);
    println!("  status:   {}", review.status);
    println!("  round:    {}", review.current_round);
    if let Some(message) = &review.message {
        println!("  message:  {}", message);
    }
    println!("  url:      {}", service.review_url(&review));
    println!(
        "  created:  {}",
        review.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if threads.is_empty() {
        println!("No comment threads.");
        return Ok(());
    }

    let resolved = threads.iter().filter(|t| t.resolved).count();
    println!(
        "Threads ({} pending, {} resolved):",
        threads.len() - resolved,
        resolved
    );
    for thread in &threads {
        print_thread(thread);
    }

    Ok(())
}

fn print_thread(thread: &CommentThread) {
    let lines = if thread.line_start == thread.line_end {
        format!("L{}", thread.line_start)
    } else {
        format!("L{}-{}", thread.line_start, thread.line_end)
    };
    let mark = if thread.resolved { "✓" } else { "•" };

    println!();
    println!(
        "  {} {} [{}] round {} ({})",
        mark, thread.id, lines, thread.round, thread.author
    );
    println!("    {}", thread.body);
    for reply in &thread.replies {
        println!("      ↳ {}: {}", reply.author, reply.body);
    }
}
