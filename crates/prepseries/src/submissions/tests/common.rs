use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::catalog::{
    BuyerId, CatalogError, GroupTag, Paper, PaperCatalog, PaperFilter, PaperId, PaperType,
    ProductId, StorageRef, SubjectCode,
};
use crate::entitlement::{Enrollment, EnrollmentStore, EnrollmentStoreError, EntitlementKey};
use crate::submissions::domain::{AnswerSheetUpload, Submission};
use crate::submissions::repository::{
    AnswerSheetStore, FileStoreError, SubmissionStore, SubmissionStoreError, UpdateGuard,
};
use crate::submissions::service::SubmissionService;

pub(super) const BUYER: &str = "buyer-1";
pub(super) const PRODUCT: &str = "full-prod";

pub(super) fn paper(
    id: &str,
    subject: SubjectCode,
    paper_type: PaperType,
    series: Option<u8>,
) -> Paper {
    Paper {
        id: PaperId(id.to_string()),
        product: ProductId(PRODUCT.to_string()),
        group: GroupTag("set-a".to_string()),
        subject,
        paper_type,
        paper_number: 1,
        syllabus_coverage_pct: 100,
        series,
        available_from: NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date"),
        storage_ref: StorageRef(format!("papers/{id}.pdf")),
    }
}

pub(super) fn seeded_papers() -> Vec<Paper> {
    vec![
        paper("q-fr-s1", SubjectCode::Fr, PaperType::Question, Some(1)),
        paper("sa-fr-s1", SubjectCode::Fr, PaperType::SuggestedAnswer, Some(1)),
        paper("q-fr-s2", SubjectCode::Fr, PaperType::Question, Some(2)),
        paper("sa-fr-s2", SubjectCode::Fr, PaperType::SuggestedAnswer, Some(2)),
        // AFM deliberately has no suggested-answer companion uploaded yet.
        paper("q-afm-s1", SubjectCode::Afm, PaperType::Question, Some(1)),
    ]
}

pub(super) fn upload(name: &str) -> AnswerSheetUpload {
    AnswerSheetUpload {
        file_name: name.to_string(),
        content: vec![0x25, 0x50, 0x44, 0x46],
    }
}

#[derive(Default)]
pub(super) struct MemoryPapers {
    papers: Vec<Paper>,
}

impl MemoryPapers {
    pub(super) fn seeded() -> Self {
        Self {
            papers: seeded_papers(),
        }
    }
}

impl PaperCatalog for MemoryPapers {
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
pub(super) struct MemoryEnrollments {
    records: Mutex<HashMap<(BuyerId, ProductId), Enrollment>>,
}

impl MemoryEnrollments {
    pub(super) fn seeded() -> Self {
        let store = Self::default();
        let enrollment = Enrollment {
            buyer: BuyerId(BUYER.to_string()),
            product: ProductId(PRODUCT.to_string()),
            keys: ["series1-FR", "series1-AFM"]
                .iter()
                .map(|raw| EntitlementKey::parse(raw).expect("valid key"))
                .collect(),
        };
        store.record(enrollment).expect("seed enrollment");
        store
    }
}

impl EnrollmentStore for MemoryEnrollments {
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

#[derive(Default)]
pub(super) struct MemorySubmissions {
    records: Mutex<HashMap<(BuyerId, PaperId), Submission>>,
}

impl MemorySubmissions {
    pub(super) fn stored(&self, buyer: &str, paper: &str) -> Option<Submission> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        guard
            .get(&(BuyerId(buyer.to_string()), PaperId(paper.to_string())))
            .cloned()
    }

    pub(super) fn force_viewed(&self, buyer: &str, paper: &str) {
        let mut guard = self.records.lock().expect("submission mutex poisoned");
        if let Some(record) = guard.get_mut(&(BuyerId(buyer.to_string()), PaperId(paper.to_string())))
        {
            record.suggested_answer_viewed = true;
        }
    }
}

impl SubmissionStore for MemorySubmissions {
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

/// Store that lets a concurrent suggested-answer view win the race just
/// before a submit commits, so the loser path can be exercised.
pub(super) struct ViewSnipedSubmissions {
    pub(super) inner: Arc<MemorySubmissions>,
    sniped: Mutex<bool>,
}

impl ViewSnipedSubmissions {
    pub(super) fn new(inner: Arc<MemorySubmissions>) -> Self {
        Self {
            inner,
            sniped: Mutex::new(false),
        }
    }
}

impl SubmissionStore for ViewSnipedSubmissions {
    fn create_or_get(
        &self,
        buyer: &BuyerId,
        paper: &PaperId,
    ) -> Result<Submission, SubmissionStoreError> {
        self.inner.create_or_get(buyer, paper)
    }

    fn update_guarded(
        &self,
        submission: Submission,
        guard: UpdateGuard,
    ) -> Result<(), SubmissionStoreError> {
        let mut sniped = self.sniped.lock().expect("snipe mutex poisoned");
        if !*sniped {
            *sniped = true;
            self.inner
                .force_viewed(&submission.buyer.0, &submission.paper.0);
        }
        drop(sniped);
        self.inner.update_guarded(submission, guard)
    }

    fn list_for_paper(&self, paper: &PaperId) -> Result<Vec<Submission>, SubmissionStoreError> {
        self.inner.list_for_paper(paper)
    }
}

#[derive(Default)]
pub(super) struct MemoryFiles {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    sequence: AtomicU64,
}

impl MemoryFiles {
    pub(super) fn object_count(&self) -> usize {
        self.objects.lock().expect("file mutex poisoned").len()
    }

    pub(super) fn with_suggested_answers() -> Self {
        let files = Self::default();
        for paper in seeded_papers() {
            if paper.paper_type == PaperType::SuggestedAnswer {
                let mut objects = files.objects.lock().expect("file mutex poisoned");
                objects.insert(paper.storage_ref.0.clone(), b"%PDF".to_vec());
            }
        }
        files
    }
}

impl AnswerSheetStore for MemoryFiles {
    fn store(
        &self,
        buyer: &BuyerId,
        paper: &PaperId,
        upload: AnswerSheetUpload,
    ) -> Result<StorageRef, FileStoreError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let reference = format!("sheets/{}/{}/{sequence}-{}", buyer.0, paper.0, upload.file_name);
        let mut objects = self.objects.lock().expect("file mutex poisoned");
        objects.insert(reference.clone(), upload.content);
        Ok(StorageRef(reference))
    }

    fn url(&self, reference: &StorageRef) -> Result<String, FileStoreError> {
        let objects = self.objects.lock().expect("file mutex poisoned");
        if objects.contains_key(&reference.0) {
            Ok(format!("https://files.test/{}?sig=short-lived", reference.0))
        } else {
            Err(FileStoreError::MissingArtifact(reference.0.clone()))
        }
    }
}

/// File store whose uploads always fail, for the storage-failure path.
pub(super) struct RejectingFiles;

impl AnswerSheetStore for RejectingFiles {
    fn store(
        &self,
        _buyer: &BuyerId,
        _paper: &PaperId,
        _upload: AnswerSheetUpload,
    ) -> Result<StorageRef, FileStoreError> {
        Err(FileStoreError::Rejected("quota exceeded".to_string()))
    }

    fn url(&self, reference: &StorageRef) -> Result<String, FileStoreError> {
        Err(FileStoreError::MissingArtifact(reference.0.clone()))
    }
}

pub(super) type MemoryService =
    SubmissionService<MemoryPapers, MemoryEnrollments, MemorySubmissions, MemoryFiles>;

pub(super) fn build_service() -> (
    Arc<MemoryService>,
    Arc<MemorySubmissions>,
    Arc<MemoryFiles>,
) {
    let submissions = Arc::new(MemorySubmissions::default());
    let files = Arc::new(MemoryFiles::with_suggested_answers());
    let service = Arc::new(SubmissionService::new(
        Arc::new(MemoryPapers::seeded()),
        Arc::new(MemoryEnrollments::seeded()),
        submissions.clone(),
        files.clone(),
    ));
    (service, submissions, files)
}

pub(super) fn buyer() -> BuyerId {
    BuyerId(BUYER.to_string())
}

pub(super) fn paper_id(raw: &str) -> PaperId {
    PaperId(raw.to_string())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}
