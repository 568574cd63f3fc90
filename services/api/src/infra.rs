use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use prepseries::catalog::{
    BuyerId, CatalogError, CatalogStore, GroupTag, Paper, PaperCatalog, PaperFilter, PaperId,
    PaperType, PriceBook, Product, ProductId, ProductKind, StorageRef, SubjectCode,
};
use prepseries::entitlement::{Enrollment, EnrollmentStore, EnrollmentStoreError};
use prepseries::pricing::{DiscountDescriptor, DiscountError, DiscountKind, DiscountResolver};
use prepseries::submissions::{
    AnswerSheetStore, AnswerSheetUpload, FileStoreError, Submission, SubmissionStore,
    SubmissionStoreError, UpdateGuard,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Read-only catalog seeded at startup. Products and papers come from the
/// catalog-management collaborator in production; the in-process copy backs
/// the demo and local serving.
pub(crate) struct SeededCatalog {
    products: Vec<Product>,
    papers: Vec<Paper>,
}

impl SeededCatalog {
    pub(crate) fn new(products: Vec<Product>, papers: Vec<Paper>) -> Self {
        Self { products, papers }
    }
}

impl CatalogStore for SeededCatalog {
    fn product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.iter().find(|product| &product.id == id).cloned())
    }
}

impl PaperCatalog for SeededCatalog {
    fn paper(&self, id: &PaperId) -> Result<Option<Paper>, CatalogError> {
        Ok(self.papers.iter().find(|paper| &paper.id == id).cloned())
    }

    fn papers(&self, product: &ProductId, filter: &PaperFilter) -> Result<Vec<Paper>, CatalogError> {
        Ok(self
            .papers
            .iter()
            .filter(|paper| &paper.product == product && filter.matches(paper))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryCouponBook {
    coupons: HashMap<String, DiscountDescriptor>,
}

impl InMemoryCouponBook {
    pub(crate) fn with(coupons: Vec<DiscountDescriptor>) -> Self {
        Self {
            coupons: coupons
                .into_iter()
                .map(|descriptor| (descriptor.code.clone(), descriptor))
                .collect(),
        }
    }
}

impl DiscountResolver for InMemoryCouponBook {
    fn resolve(&self, code: &str) -> Result<DiscountDescriptor, DiscountError> {
        self.coupons
            .get(code)
            .cloned()
            .ok_or_else(|| DiscountError::NotFound(code.to_string()))
    }
}

#[derive(Default)]
pub(crate) struct InMemoryEnrollmentStore {
    records: Mutex<HashMap<(BuyerId, ProductId), Enrollment>>,
}

impl EnrollmentStore for InMemoryEnrollmentStore {
    fn record(&self, enrollment: Enrollment) -> Result<Enrollment, EnrollmentStoreError> {
        let mut guard = self.records.lock().expect("enrollment mutex poisoned");
        let key = (enrollment.buyer.clone(), enrollment.product.clone());
        if guard.contains_key(&key) {
            return Err(EnrollmentStoreError::Conflict);
        }
        guard.insert(key, enrollment.clone());
        Ok(enrollment)
    }

    fn fetch(
        &self,
        buyer: &BuyerId,
        product: &ProductId,
    ) -> Result<Option<Enrollment>, EnrollmentStoreError> {
        let guard = self.records.lock().expect("enrollment mutex poisoned");
        Ok(guard.get(&(buyer.clone(), product.clone())).cloned())
    }
}

/// Guarded updates check-and-swap under one mutex, which makes the guard the
/// serialization point for the whole submission state machine.
#[derive(Default)]
pub(crate) struct InMemorySubmissionStore {
    records: Mutex<HashMap<(BuyerId, PaperId), Submission>>,
}

impl SubmissionStore for InMemorySubmissionStore {
    fn create_or_get(
        &self,
        buyer: &BuyerId,
        paper: &PaperId,
    ) -> Result<Submission, SubmissionStoreError> {
        let mut guard = self.records.lock().expect("submission mutex poisoned");
        Ok(guard
            .entry((buyer.clone(), paper.clone()))
            .or_insert_with(|| Submission::fresh(buyer.clone(), paper.clone()))
            .clone())
    }

    fn update_guarded(
        &self,
        submission: Submission,
        guard: UpdateGuard,
    ) -> Result<(), SubmissionStoreError> {
        let mut records = self.records.lock().expect("submission mutex poisoned");
        let key = (submission.buyer.clone(), submission.paper.clone());
        let current = records.get(&key).ok_or(SubmissionStoreError::NotFound)?;
        if !guard.admits(current) {
            return Err(SubmissionStoreError::Conflict);
        }
        records.insert(key, submission);
        Ok(())
    }

    fn list_for_paper(&self, paper: &PaperId) -> Result<Vec<Submission>, SubmissionStoreError> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        Ok(guard
            .values()
            .filter(|submission| &submission.paper == paper)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryAnswerSheetStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    sequence: AtomicU64,
}

impl InMemoryAnswerSheetStore {
    /// Pre-load the artifacts the seeded catalog's papers point at, so that
    /// suggested-answer URLs resolve out of the box.
    pub(crate) fn preloaded(papers: &[Paper]) -> Self {
        let store = Self::default();
        {
            let mut objects = store.objects.lock().expect("file mutex poisoned");
            for paper in papers {
                objects.insert(paper.storage_ref.0.clone(), b"%PDF".to_vec());
            }
        }
        store
    }
}

impl AnswerSheetStore for InMemoryAnswerSheetStore {
    fn store(
        &self,
        buyer: &BuyerId,
        paper: &PaperId,
        upload: AnswerSheetUpload,
    ) -> Result<StorageRef, FileStoreError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let reference = format!("sheets/{}/{}/{sequence}-{}", buyer.0, paper.0, upload.file_name);
        self.objects
            .lock()
            .expect("file mutex poisoned")
            .insert(reference.clone(), upload.content);
        Ok(StorageRef(reference))
    }

    fn url(&self, reference: &StorageRef) -> Result<String, FileStoreError> {
        let objects = self.objects.lock().expect("file mutex poisoned");
        if objects.contains_key(&reference.0) {
            Ok(format!("https://files.local/{}?sig=short-lived", reference.0))
        } else {
            Err(FileStoreError::MissingArtifact(reference.0.clone()))
        }
    }
}

/// The catalog every `serve`, `quote`, and `demo` run starts from: one
/// three-series full test series across all five subjects, plus a per-paper
/// priced crash course for the fallback tier.
pub(crate) fn seed_catalog() -> (Vec<Product>, Vec<Paper>) {
    let released = NaiveDate::from_ymd_opt(2026, 1, 15).expect("valid release date");

    let full = Product {
        id: ProductId("full-2026".to_string()),
        name: "CA Final Full Test Series 2026".to_string(),
        kind: ProductKind::Full { series_count: 3 },
        subjects: SubjectCode::ALL.to_vec(),
        papers_per_subject: SubjectCode::ALL.iter().map(|&subject| (subject, 1)).collect(),
        price_book: PriceBook {
            per_subject: Some(450),
            combo: Some(1250),
            all_subjects: Some(2000),
            full_bundle: Some(6000),
            per_paper: Some(150),
        },
    };

    let crash = Product {
        id: ProductId("crash-idt-2026".to_string()),
        name: "IDT Crash Course 2026".to_string(),
        kind: ProductKind::Special,
        subjects: vec![SubjectCode::Idt],
        papers_per_subject: [(SubjectCode::Idt, 8)].into_iter().collect(),
        price_book: PriceBook {
            per_paper: Some(150),
            ..PriceBook::default()
        },
    };

    let mut papers = Vec::new();
    for &subject in &SubjectCode::ALL {
        for series in 1u8..=3 {
            for paper_type in [PaperType::Question, PaperType::SuggestedAnswer] {
                let prefix = match paper_type {
                    PaperType::Question => "q",
                    PaperType::SuggestedAnswer => "sa",
                    PaperType::EvaluatedTemplate => "et",
                };
                let id = format!("{prefix}-{}-s{series}", subject.label().to_ascii_lowercase());
                papers.push(Paper {
                    id: PaperId(id.clone()),
                    product: full.id.clone(),
                    group: GroupTag("set-a".to_string()),
                    subject,
                    paper_type,
                    paper_number: 1,
                    syllabus_coverage_pct: 100,
                    series: Some(series),
                    available_from: released,
                    storage_ref: StorageRef(format!("papers/{id}.pdf")),
                });
            }
        }
    }

    (vec![full, crash], papers)
}

pub(crate) fn seed_coupons() -> Vec<DiscountDescriptor> {
    vec![
        DiscountDescriptor {
            code: "SAVE100".to_string(),
            kind: DiscountKind::Flat,
            value: 100,
        },
        DiscountDescriptor {
            code: "FEST10".to_string(),
            kind: DiscountKind::Percent,
            value: 10,
        },
    ]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
