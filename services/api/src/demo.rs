use crate::infra::{board_service, seeded_board, DemoBoardService, DEMO_CANDIDATE_TOKEN};
use chrono::Utc;
use clap::Args;
use hireboard::board::{FilterCriteria, JobCardView};
use hireboard::config::AppConfig;
use hireboard::error::AppError;
use hireboard::request::ActionError;
use hireboard::session::AccessToken;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// CSV export of postings to load instead of the built-in sample.
    #[arg(long)]
    pub(crate) seed_csv: Option<PathBuf>,
    /// Case-insensitive title search.
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Exact location match.
    #[arg(long)]
    pub(crate) location: Option<String>,
    /// Minimum monthly salary.
    #[arg(long)]
    pub(crate) min_salary: Option<u32>,
    /// Only remote roles.
    #[arg(long)]
    pub(crate) remote: bool,
    /// Only part-time roles.
    #[arg(long)]
    pub(crate) part_time: bool,
    /// Also show what happens when the candidate opens the post-job page.
    #[arg(long)]
    pub(crate) try_post: bool,
}

impl DemoArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search_query: self.search.clone().unwrap_or_default(),
            location: self.location.clone().unwrap_or_default(),
            company_id: None,
            min_salary: self.min_salary.unwrap_or_default(),
            is_remote: self.remote,
            is_part_time: self.part_time,
        }
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(seed_csv) = args.seed_csv.clone() {
        config.board.seed_csv = Some(seed_csv);
    }

    let board = seeded_board(&config.board)?;
    let (service, notifications) = board_service(board, &config.board);
    let criteria = args.criteria();

    println!("Job board demo");
    println!(
        "Active filters: {} | policy {:?}",
        criteria.active_count(),
        service.settlement()
    );

    match listing_cards(&service, criteria).await {
        Ok(cards) if cards.is_empty() => println!("\nNo jobs match these filters."),
        Ok(cards) => {
            println!("\n{} matching jobs", cards.len());
            for card in &cards {
                println!(
                    "- #{} {} @ {} | {} | {}/month | posted {}",
                    card.id,
                    card.title,
                    card.company_name.as_deref().unwrap_or("unknown company"),
                    card.location_label,
                    card.salary,
                    card.posted
                );
                if !card.teaser.is_empty() {
                    println!("    {}", card.teaser);
                }
            }
        }
        Err(err) => println!("\nListing unavailable: {err}"),
    }

    if args.try_post {
        let session = service.session(Some(AccessToken::new(DEMO_CANDIDATE_TOKEN)));
        match service.guard_post_job(&session).await {
            Ok(user) => println!("\n{} may post jobs", user.full_name),
            Err(rejection) => println!(
                "\nPost-job page refused ({rejection}), redirecting to {}",
                rejection.redirect()
            ),
        }
    }

    let events = notifications.events();
    if events.is_empty() {
        println!("\nNotifications: none");
    } else {
        println!("\nNotifications");
        for event in events {
            println!("- [{:?}] {}", event.level, event.message);
        }
    }

    Ok(())
}

/// Runs one listing request as the demo candidate and renders the cards.
pub(crate) async fn listing_cards(
    service: &DemoBoardService,
    criteria: FilterCriteria,
) -> Result<Vec<JobCardView>, ActionError> {
    let session = service.session(Some(AccessToken::new(DEMO_CANDIDATE_TOKEN)));
    let listing = service.list_jobs(&session);
    let outcome = listing.trigger(criteria).await;
    let snapshot = listing.snapshot();

    match (outcome, snapshot.error) {
        (Some(jobs), _) => Ok(JobCardView::listing(&jobs, &[], Utc::now())),
        (None, Some(err)) => Err(err),
        (None, None) => Err(ActionError::unavailable("listing was not settled")),
    }
}
