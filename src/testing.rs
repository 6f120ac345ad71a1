//! In-process stand-in for the Remote Job API, served by actix-web on an
//! ephemeral port and backed by an in-memory job list.

use actix_web::{dev::ServerHandle, web, App, HttpResponse, HttpServer};
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::query::{JobQueries, QueryClient, QueryOptions, DEFAULT_GC_TIME};
use crate::remote::models::{SortKey, SortOrder, StatusUpdateRequest};
use crate::remote::{
    Job, JobApiClient, JobStatus, JobSummary, NotificationChannel, NotificationSettings,
    NotificationSettingsUpdate, PageResponse, RemoteType, SearchRequest, Sort, StatsOverview,
    TestNotificationResult,
};
use crate::state::AppState;

const TITLES: [(&str, &[&str]); 5] = [
    ("Rust API", &["Rust", "PostgreSQL"]),
    ("Java Spring backend", &["Java", "Spring"]),
    ("Python data pipeline", &["Python", "AWS"]),
    ("Go platform", &["Go", "Kubernetes"]),
    ("TypeScript frontend", &["TypeScript", "React"]),
];

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap()
}

pub fn sample_job(id: i64) -> Job {
    let (title, skills) = TITLES[(id as usize) % TITLES.len()];
    let remote_type = match id % 3 {
        0 => RemoteType::Full,
        1 => RemoteType::Partial,
        _ => RemoteType::Onsite,
    };
    let max_price = 50 + ((id * 7) % 40) as i32;

    Job {
        id,
        source: if id % 2 == 0 { "SESBoard" } else { "TechDirect" }.to_string(),
        source_url: format!("https://example.com/jobs/{}", id),
        source_id: Some(format!("ext-{}", id)),
        title: format!("{} #{}", title, id),
        min_price: Some(max_price - 10),
        max_price: Some(max_price),
        price_type: None,
        settlement_hours: Some("140-180h".to_string()),
        required_skills: skills.iter().map(|s| s.to_string()).collect(),
        preferred_skills: vec!["Docker".to_string()],
        experience_years: Some("3+".to_string()),
        location: Some(if id % 2 == 0 { "Tokyo" } else { "Osaka" }.to_string()),
        remote_type: Some(remote_type),
        work_days: Some("5 days".to_string()),
        start_date: None,
        contract_period: None,
        company_name: Some("Example KK".to_string()),
        industry: None,
        description: Some(format!("Work on {}", title)),
        status: JobStatus::New,
        is_favorite: false,
        posted_at: Some(base_time() + ChronoDuration::hours(id)),
        crawled_at: base_time() + ChronoDuration::minutes(id),
        created_at: base_time(),
    }
}

fn default_settings() -> NotificationSettings {
    NotificationSettings {
        id: 1,
        email_enabled: false,
        email_address: None,
        line_enabled: false,
        slack_enabled: false,
        min_price_threshold: None,
        skills_filter: None,
        remote_only: false,
        notify_interval_hours: 6,
        last_notified_at: None,
    }
}

/// Backend state plus call log and failure injection
pub struct MockStore {
    jobs: Mutex<Vec<Job>>,
    settings: Mutex<NotificationSettings>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, usize>>,
    corrupt_stats: AtomicBool,
    delay_ms: AtomicU64,
}

impl MockStore {
    pub fn with_jobs(count: i64) -> Self {
        Self {
            jobs: Mutex::new((1..=count).map(sample_job).collect()),
            settings: Mutex::new(default_settings()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            corrupt_stats: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        }
    }

    pub fn insert_job(&self, title: &str, skills: &[&str], max_price: Option<i32>) -> i64 {
        let mut jobs = self.jobs.lock().unwrap();
        let id = jobs.iter().map(|j| j.id).max().unwrap_or(0) + 1;
        let mut job = sample_job(id);
        job.title = title.to_string();
        job.description = None;
        job.required_skills = skills.iter().map(|s| s.to_string()).collect();
        job.min_price = max_price;
        job.max_price = max_price;
        jobs.push(job);
        id
    }

    pub fn job(&self, id: i64) -> Option<Job> {
        self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned()
    }

    /// Number of requests seen for `route`, e.g. `GET /jobs/3`
    pub fn calls(&self, route: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == route)
            .count()
    }

    /// Answer the next `count` requests for `route` with a 500
    pub fn fail_next(&self, route: &str, count: usize) {
        self.failures
            .lock()
            .unwrap()
            .insert(route.to_string(), count);
    }

    pub fn corrupt_stats(&self, corrupt: bool) {
        self.corrupt_stats.store(corrupt, Ordering::SeqCst);
    }

    /// Delay every response by `delay`
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn hit(&self, route: String) -> Option<HttpResponse> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        self.calls.lock().unwrap().push(route.clone());
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&route) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Some(HttpResponse::InternalServerError().body("injected failure"))
            }
            _ => None,
        }
    }

    fn update_job(&self, id: i64, apply: impl FnOnce(&mut Job)) -> Option<Job> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.iter_mut().find(|j| j.id == id)?;
        apply(job);
        Some(job.clone())
    }
}

fn compare(a: &Job, b: &Job, key: SortKey) -> CmpOrdering {
    match key {
        SortKey::CrawledAt => a.crawled_at.cmp(&b.crawled_at),
        SortKey::MaxPrice => a.max_price.cmp(&b.max_price),
        SortKey::PostedAt => a.posted_at.cmp(&b.posted_at),
    }
}

fn sort_jobs(jobs: &mut [Job], sort: Sort) {
    jobs.sort_by(|a, b| {
        let ordering = compare(a, b, sort.key).then(a.id.cmp(&b.id));
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn paginate(jobs: Vec<Job>, page: u32, size: u32) -> PageResponse<JobSummary> {
    let size = size.max(1);
    let total = jobs.len() as u64;
    let total_pages = total.div_ceil(size as u64) as u32;
    let content: Vec<JobSummary> = jobs
        .iter()
        .skip(page as usize * size as usize)
        .take(size as usize)
        .map(Job::summary)
        .collect();

    PageResponse {
        empty: content.is_empty(),
        first: page == 0,
        last: page + 1 >= total_pages,
        content,
        total_elements: total,
        total_pages,
        size,
        number: page,
    }
}

fn matches(job: &Job, request: &SearchRequest) -> bool {
    if let Some(keyword) = &request.keyword {
        let keyword = keyword.to_lowercase();
        let in_title = job.title.to_lowercase().contains(&keyword);
        let in_description = job
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&keyword));
        let in_skills = job
            .required_skills
            .iter()
            .any(|s| s.to_lowercase().contains(&keyword));
        if !(in_title || in_description || in_skills) {
            return false;
        }
    }
    if let Some(min) = request.min_price {
        if job.max_price.map_or(true, |p| p < min) {
            return false;
        }
    }
    if let Some(max) = request.max_price {
        if job.min_price.or(job.max_price).map_or(true, |p| p > max) {
            return false;
        }
    }
    if let Some(location) = &request.location {
        if !job.location.as_deref().is_some_and(|l| l.contains(location.as_str())) {
            return false;
        }
    }
    if request.remote_type.is_some() && job.remote_type != request.remote_type {
        return false;
    }
    if !request.skills.is_empty()
        && !request
            .skills
            .iter()
            .any(|s| job.required_skills.iter().any(|r| r.eq_ignore_ascii_case(s)))
    {
        return false;
    }
    if !request.sources.is_empty() && !request.sources.contains(&job.source) {
        return false;
    }
    true
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    page: Option<u32>,
    size: Option<u32>,
    sort_by: Option<SortKey>,
    sort_order: Option<SortOrder>,
}

async fn list_jobs(store: web::Data<MockStore>, params: web::Query<PageParams>) -> HttpResponse {
    if let Some(failure) = store.hit("GET /jobs".to_string()).await {
        return failure;
    }
    let default = Sort::default();
    let sort = Sort::new(
        params.sort_by.unwrap_or(default.key),
        params.sort_order.unwrap_or(default.order),
    );
    let mut jobs = store.jobs.lock().unwrap().clone();
    sort_jobs(&mut jobs, sort);
    HttpResponse::Ok().json(paginate(jobs, params.page.unwrap_or(0), params.size.unwrap_or(20)))
}

async fn search_jobs(
    store: web::Data<MockStore>,
    request: web::Json<SearchRequest>,
) -> HttpResponse {
    if let Some(failure) = store.hit("POST /jobs/search".to_string()).await {
        return failure;
    }
    let mut jobs: Vec<Job> = store
        .jobs
        .lock()
        .unwrap()
        .iter()
        .filter(|j| matches(j, &request))
        .cloned()
        .collect();
    sort_jobs(&mut jobs, request.sort());
    HttpResponse::Ok().json(paginate(
        jobs,
        request.page.unwrap_or(0),
        request.size.unwrap_or(20),
    ))
}

async fn list_favorites(
    store: web::Data<MockStore>,
    params: web::Query<PageParams>,
) -> HttpResponse {
    if let Some(failure) = store.hit("GET /jobs/favorites".to_string()).await {
        return failure;
    }
    let mut jobs: Vec<Job> = store
        .jobs
        .lock()
        .unwrap()
        .iter()
        .filter(|j| j.is_favorite)
        .cloned()
        .collect();
    sort_jobs(&mut jobs, Sort::default());
    HttpResponse::Ok().json(paginate(jobs, params.page.unwrap_or(0), params.size.unwrap_or(20)))
}

async fn get_stats(store: web::Data<MockStore>) -> HttpResponse {
    if let Some(failure) = store.hit("GET /jobs/stats".to_string()).await {
        return failure;
    }
    if store.corrupt_stats.load(Ordering::SeqCst) {
        return HttpResponse::Ok().json(serde_json::json!({"total": "many"}));
    }

    let jobs = store.jobs.lock().unwrap();
    let prices: Vec<i32> = jobs.iter().filter_map(|j| j.max_price).collect();
    let mut by_source = BTreeMap::new();
    for job in jobs.iter() {
        *by_source.entry(job.source.clone()).or_insert(0u64) += 1;
    }

    HttpResponse::Ok().json(StatsOverview {
        total_jobs: jobs.len() as u64,
        new_jobs: jobs.iter().filter(|j| j.status == JobStatus::New).count() as u64,
        favorite_jobs: jobs.iter().filter(|j| j.is_favorite).count() as u64,
        average_price: if prices.is_empty() {
            None
        } else {
            Some(prices.iter().map(|p| *p as f64).sum::<f64>() / prices.len() as f64)
        },
        jobs_by_source: by_source,
    })
}

async fn get_job(store: web::Data<MockStore>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    if let Some(failure) = store.hit(format!("GET /jobs/{}", id)).await {
        return failure;
    }
    match store.job(id) {
        Some(job) => HttpResponse::Ok().json(job),
        None => HttpResponse::NotFound().finish(),
    }
}

async fn update_status(
    store: web::Data<MockStore>,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    if let Some(failure) = store.hit(format!("PATCH /jobs/{}/status", id)).await {
        return failure;
    }
    match store.update_job(id, |job| job.status = body.status) {
        Some(job) => HttpResponse::Ok().json(job),
        None => HttpResponse::NotFound().finish(),
    }
}

async fn toggle_favorite(store: web::Data<MockStore>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    if let Some(failure) = store.hit(format!("POST /jobs/{}/favorite", id)).await {
        return failure;
    }
    match store.update_job(id, |job| job.is_favorite = !job.is_favorite) {
        Some(job) => HttpResponse::Ok().json(job),
        None => HttpResponse::NotFound().finish(),
    }
}

async fn get_settings(store: web::Data<MockStore>) -> HttpResponse {
    if let Some(failure) = store.hit("GET /notifications/settings".to_string()).await {
        return failure;
    }
    HttpResponse::Ok().json(store.settings.lock().unwrap().clone())
}

async fn put_settings(
    store: web::Data<MockStore>,
    update: web::Json<NotificationSettingsUpdate>,
) -> HttpResponse {
    if let Some(failure) = store.hit("PUT /notifications/settings".to_string()).await {
        return failure;
    }
    let mut settings = store.settings.lock().unwrap();
    settings.email_enabled = update.email_enabled;
    settings.line_enabled = update.line_enabled;
    settings.slack_enabled = update.slack_enabled;
    settings.remote_only = update.remote_only;
    settings.notify_interval_hours = update.notify_interval_hours;
    if let Some(address) = &update.email_address {
        settings.email_address = Some(address.clone());
    }
    if let Some(threshold) = update.min_price_threshold {
        settings.min_price_threshold = Some(threshold);
    }
    if let Some(skills) = &update.skills_filter {
        settings.skills_filter = Some(skills.clone());
    }
    HttpResponse::Ok().json(settings.clone())
}

async fn test_notification(store: web::Data<MockStore>, path: web::Path<String>) -> HttpResponse {
    let Ok(channel) = path.parse::<NotificationChannel>() else {
        return HttpResponse::BadRequest().finish();
    };
    if let Some(failure) = store
        .hit(format!("POST /notifications/test/{}", channel.as_str()))
        .await
    {
        return failure;
    }
    HttpResponse::Ok().json(TestNotificationResult {
        success: true,
        channel: Some(channel.as_str().to_string()),
        message: "Test notification sent".to_string(),
    })
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/jobs", web::get().to(list_jobs))
        .route("/jobs/search", web::post().to(search_jobs))
        .route("/jobs/favorites", web::get().to(list_favorites))
        .route("/jobs/stats", web::get().to(get_stats))
        .route("/jobs/{id}", web::get().to(get_job))
        .route("/jobs/{id}/status", web::patch().to(update_status))
        .route("/jobs/{id}/favorite", web::post().to(toggle_favorite))
        .route("/notifications/settings", web::get().to(get_settings))
        .route("/notifications/settings", web::put().to(put_settings))
        .route("/notifications/test/{channel}", web::post().to(test_notification));
}

/// Running mock backend; `base_url` ends in `/api` like the real one
pub struct MockBackend {
    pub base_url: String,
    pub store: Arc<MockStore>,
    handle: ServerHandle,
}

impl MockBackend {
    pub async fn start(store: MockStore) -> Self {
        let store = Arc::new(store);
        let data = web::Data::from(store.clone());

        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .service(web::scope("/api").configure(routes))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("mock backend failed to bind");

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: format!("http://{}/api", addr),
            store,
            handle,
        }
    }

    pub async fn start_with_jobs(count: i64) -> Self {
        Self::start(MockStore::with_jobs(count)).await
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

/// Dashboard state wired to `backend`, with a generous render deadline
pub fn test_state(backend: &MockBackend) -> AppState {
    let api = JobApiClient::new(&backend.base_url).unwrap();
    let queries = JobQueries::new(
        QueryClient::new(QueryOptions::default(), DEFAULT_GC_TIME),
        api,
    );
    AppState::new(queries, 20, Duration::from_secs(5))
}

/// Initialised dashboard service over `state`, configured like `main`
macro_rules! dashboard_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .app_data(crate::api::validation::query_config())
                .app_data(crate::api::validation::form_config())
                .configure(crate::api::dashboard_config)
                .default_service(actix_web::web::to(crate::api::not_found)),
        )
        .await
    };
}
pub(crate) use dashboard_app;
