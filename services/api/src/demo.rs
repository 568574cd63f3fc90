use crate::infra::{
    seed_catalog, seed_coupons, InMemoryAnswerSheetStore, InMemoryCouponBook,
    InMemoryEnrollmentStore, InMemorySubmissionStore, SeededCatalog,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use prepseries::catalog::{BuyerId, PaperId, ProductId, SubjectCode};
use prepseries::error::AppError;
use prepseries::pricing::Selection;
use prepseries::storefront::StorefrontService;
use prepseries::submissions::{
    AnswerSheetUpload, EvaluationRequest, SubmissionService,
};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Product to price (defaults to the seeded full test series)
    #[arg(long, default_value = "full-2026")]
    pub(crate) product: String,
    /// Subjects to include, comma separated (e.g. FR,AFM,AUDIT)
    #[arg(long, value_delimiter = ',', value_parser = parse_subject)]
    pub(crate) subjects: Vec<SubjectCode>,
    /// Series indices to include, comma separated (full series only)
    #[arg(long, value_delimiter = ',')]
    pub(crate) series: Vec<u8>,
    /// Coupon code to apply
    #[arg(long)]
    pub(crate) coupon: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the demo's "today" (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Coupon code to apply to the demo purchase (try SAVE100 or FEST10)
    #[arg(long)]
    pub(crate) coupon: Option<String>,
    /// Skip the second buyer who previews the suggested answer
    #[arg(long)]
    pub(crate) skip_preview_buyer: bool,
}

fn parse_subject(raw: &str) -> Result<SubjectCode, String> {
    SubjectCode::parse(raw).ok_or_else(|| format!("unknown subject code '{raw}'"))
}

type DemoStorefront =
    StorefrontService<SeededCatalog, InMemoryCouponBook, SeededCatalog, InMemoryEnrollmentStore>;
type DemoSubmissions = SubmissionService<
    SeededCatalog,
    InMemoryEnrollmentStore,
    InMemorySubmissionStore,
    InMemoryAnswerSheetStore,
>;

fn build_services() -> (Arc<DemoStorefront>, Arc<DemoSubmissions>) {
    let (products, papers) = seed_catalog();
    let files = Arc::new(InMemoryAnswerSheetStore::preloaded(&papers));
    let catalog = Arc::new(SeededCatalog::new(products, papers));
    let coupons = Arc::new(InMemoryCouponBook::with(seed_coupons()));
    let enrollments = Arc::new(InMemoryEnrollmentStore::default());
    let submissions = Arc::new(InMemorySubmissionStore::default());

    let storefront = Arc::new(StorefrontService::new(
        catalog.clone(),
        coupons,
        catalog.clone(),
        enrollments.clone(),
    ));
    let submission_service = Arc::new(SubmissionService::new(
        catalog,
        enrollments,
        submissions,
        files,
    ));
    (storefront, submission_service)
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let QuoteArgs {
        product,
        subjects,
        series,
        coupon,
    } = args;

    let (storefront, _) = build_services();
    let selection = Selection {
        series: series.into_iter().collect(),
        group: None,
        subjects: subjects.into_iter().collect(),
    };

    match storefront.quote(&ProductId(product), &selection, coupon.as_deref()) {
        Ok(quote) => {
            println!(
                "Quote: {} papers for Rs. {} (base Rs. {}, tier {})",
                quote.total_papers,
                quote.final_price,
                quote.base_price,
                quote.breakdown.tier.label()
            );
            match serde_json::to_string_pretty(&quote) {
                Ok(json) => println!("{json}"),
                Err(err) => println!("Quote payload unavailable: {err}"),
            }
        }
        Err(err) => println!("Quote rejected: {err}"),
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        coupon,
        skip_preview_buyer,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let (storefront, submissions) = build_services();

    println!("Test-series storefront demo (evaluated {today})");

    let product = ProductId("full-2026".to_string());
    let buyer = BuyerId("aspirant-1".to_string());
    let selection = Selection {
        series: [1, 2, 3].into_iter().collect(),
        group: None,
        subjects: SubjectCode::ALL.into_iter().collect::<BTreeSet<_>>(),
    };

    println!("\nPricing the full bundle (all subjects, series 1-3)");
    let quote = match storefront.quote(&product, &selection, coupon.as_deref()) {
        Ok(quote) => quote,
        Err(err) => {
            println!("  Quote rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "- {} papers | base Rs. {} | final Rs. {} | tier {}",
        quote.total_papers,
        quote.base_price,
        quote.final_price,
        quote.breakdown.tier.label()
    );
    if let Some(discount) = &quote.breakdown.discount {
        println!("- coupon {} applied", discount.code);
    }

    let enrollment = match storefront.complete_purchase(&buyer, &product, &selection) {
        Ok(enrollment) => enrollment,
        Err(err) => {
            println!("  Purchase failed: {err}");
            return Ok(());
        }
    };
    println!(
        "- purchase recorded for {} with {} entitlement keys",
        enrollment.buyer.0,
        enrollment.keys.len()
    );

    println!("\nEntitled paper listing (series 1 only)");
    match storefront.buyer_papers(&buyer, &product, None, Some(1), today) {
        Ok(grouped) => {
            for (subject, papers) in &grouped {
                println!("- {}: {} papers", subject.label(), papers.len());
            }
        }
        Err(err) => println!("  Listing unavailable: {err}"),
    }

    println!("\nSubmission lifecycle for the FR series-1 question paper");
    let question = PaperId("q-fr-s1".to_string());
    let upload = AnswerSheetUpload {
        file_name: "fr-attempt.pdf".to_string(),
        content: b"%PDF".to_vec(),
    };
    match submissions.submit(&buyer, &question, upload) {
        Ok(submission) => println!("- submitted -> state {}", submission.state.label()),
        Err(err) => println!("  Submission rejected: {err}"),
    }

    let evaluation = EvaluationRequest {
        marks_obtained: 64,
        max_marks: 100,
        comments: "Good coverage; presentation needs work".to_string(),
        evaluated_sheet: AnswerSheetUpload {
            file_name: "fr-attempt-evaluated.pdf".to_string(),
            content: b"%PDF".to_vec(),
        },
        evaluated_on: Some(today),
    };
    match submissions.evaluate(&buyer, &question, evaluation) {
        Ok(submission) => {
            let view = submission.status_view();
            match serde_json::to_string_pretty(&view) {
                Ok(json) => println!("- evaluated; buyer status payload:\n{json}"),
                Err(err) => println!("- evaluated; status payload unavailable: {err}"),
            }
        }
        Err(err) => println!("  Evaluation rejected: {err}"),
    }

    match submissions.paper_statistics(&question) {
        Ok(statistics) => println!(
            "- paper statistics: highest {} | average {:.1} | {} evaluated",
            statistics.highest_score, statistics.average_score, statistics.submission_count
        ),
        Err(err) => println!("  Statistics unavailable: {err}"),
    }

    if skip_preview_buyer {
        return Ok(());
    }

    println!("\nSecond buyer previews the suggested answer before submitting");
    let previewer = BuyerId("aspirant-2".to_string());
    let narrow = Selection {
        series: [1].into_iter().collect(),
        group: None,
        subjects: [SubjectCode::Fr].into_iter().collect(),
    };
    if let Err(err) = storefront.complete_purchase(&previewer, &product, &narrow) {
        println!("  Purchase failed: {err}");
        return Ok(());
    }
    match submissions.view_suggested_answer(&previewer, &question) {
        Ok(view) => println!(
            "- suggested answer served ({}); submission locked: {}",
            view.url, view.submission_locked
        ),
        Err(err) => println!("  Suggested answer unavailable: {err}"),
    }
    let upload = AnswerSheetUpload {
        file_name: "late-attempt.pdf".to_string(),
        content: b"%PDF".to_vec(),
    };
    match submissions.submit(&previewer, &question, upload) {
        Ok(_) => println!("- unexpected: submission accepted after preview"),
        Err(err) => println!("- submission refused as expected: {err}"),
    }

    Ok(())
}
