//! Route and note controller
//!
//! `Tracker` owns the in-memory routes and notes together with the list
//! filter state. Every mutation is applied in memory and then immediately
//! written back to the store as a whole collection.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::data::{
    generate_id, Fetched, Note, PaginationSettings, Route, Transport, WeatherClient,
    WeatherReport,
};
use crate::error::AppError;
use crate::pagination::Page;
use crate::storage::Store;

/// User input for creating or editing a route
///
/// Dates are kept as entered and parsed during validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDraft {
    pub name: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub transport: Transport,
    pub completed: bool,
}

impl RouteDraft {
    /// Pre-fills a draft from an existing route, for editing
    pub fn from_route(route: &Route) -> Self {
        Self {
            name: route.name.clone(),
            destination: route.destination.clone(),
            start_date: route.start_date.map(|d| d.to_string()).unwrap_or_default(),
            end_date: route.end_date.map(|d| d.to_string()).unwrap_or_default(),
            description: route.description.clone(),
            transport: route.transport,
            completed: route.completed,
        }
    }

    /// Checks required fields and parses the dates
    pub fn validate(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::MissingField("Name"));
        }
        if self.destination.trim().is_empty() {
            return Err(AppError::MissingField("Destination"));
        }
        let start = parse_date("start date", &self.start_date)?;
        let end = parse_date("end date", &self.end_date)?;
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(AppError::DateOrder);
            }
        }
        Ok((start, end))
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| AppError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

/// User input for a note
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

/// Result of a mutation: the affected record and whether it reached storage
#[derive(Debug, Clone, PartialEq)]
pub struct Saved<T> {
    pub item: T,
    pub persisted: bool,
}

/// Counters shown in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total_routes: usize,
    pub completed_routes: usize,
    pub total_notes: usize,
}

/// A page of the filtered route list
#[derive(Debug, Clone)]
pub struct RoutePage<'a> {
    pub page: Page,
    /// Routes on the page with their 1-based position in the filtered list
    pub items: Vec<(usize, &'a Route)>,
}

/// Owns routes, notes and list state
#[derive(Debug)]
pub struct Tracker {
    routes: Vec<Route>,
    notes: Vec<Note>,
    search: String,
    completed_only: bool,
    current_page: usize,
    page_size: usize,
    store: Store,
    cache: TtlCache,
    weather_ttl: Duration,
    /// Whether search, filter and page changes update the stored snapshot
    persist_view: bool,
}

impl Tracker {
    /// Loads routes, notes and the last page from the store
    pub fn open(store: Store, page_size: usize, weather_ttl: Duration) -> Self {
        if !store.is_available() {
            warn!(dir = %store.dir().display(), "storage unavailable, changes will not be saved");
        }
        let routes = store.load_routes();
        let notes = store.load_notes();
        let settings = store.load_settings();
        info!(
            routes = routes.len(),
            notes = notes.len(),
            page = settings.current_page,
            "data loaded"
        );

        Self {
            routes,
            notes,
            search: String::new(),
            completed_only: false,
            current_page: settings.current_page.max(1),
            page_size: page_size.max(1),
            cache: TtlCache::new(store.clone()),
            store,
            weather_ttl,
            persist_view: true,
        }
    }

    /// Stops search, filter and page changes from touching the stored
    /// pagination snapshot, for read-only listings
    pub fn detach_view(&mut self) {
        self.persist_view = false;
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn completed_only(&self) -> bool {
        self.completed_only
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn find_route(&self, id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// Creates a route from a validated draft and appends it
    pub fn add_route(&mut self, draft: &RouteDraft) -> Result<Saved<Route>, AppError> {
        let (start_date, end_date) = draft.validate()?;
        let now = Utc::now();
        let route = Route {
            id: generate_id(),
            name: draft.name.trim().to_string(),
            destination: draft.destination.trim().to_string(),
            start_date,
            end_date,
            description: draft.description.trim().to_string(),
            transport: draft.transport,
            completed: draft.completed,
            created_at: now,
            updated_at: now,
        };
        self.routes.push(route.clone());
        info!(id = %route.id, name = %route.name, "route added");
        Ok(Saved {
            item: route,
            persisted: self.store.save_routes(&self.routes),
        })
    }

    /// Replaces the editable fields of a route, keeping its id and creation time
    pub fn update_route(&mut self, id: &str, draft: &RouteDraft) -> Result<Saved<Route>, AppError> {
        let (start_date, end_date) = draft.validate()?;
        let route = self
            .routes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::RouteNotFound(id.to_string()))?;

        route.name = draft.name.trim().to_string();
        route.destination = draft.destination.trim().to_string();
        route.start_date = start_date;
        route.end_date = end_date;
        route.description = draft.description.trim().to_string();
        route.transport = draft.transport;
        route.completed = draft.completed;
        route.updated_at = Utc::now();
        let updated = route.clone();

        info!(id, "route updated");
        Ok(Saved {
            item: updated,
            persisted: self.store.save_routes(&self.routes),
        })
    }

    /// Removes the route with `id`, keeping the order of the others
    pub fn delete_route(&mut self, id: &str) -> Result<Saved<Route>, AppError> {
        let index = self
            .routes
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::RouteNotFound(id.to_string()))?;
        let removed = self.routes.remove(index);

        info!(id, "route deleted");
        Ok(Saved {
            item: removed,
            persisted: self.store.save_routes(&self.routes),
        })
    }

    /// Appends a note; a title is required
    pub fn add_note(&mut self, draft: &NoteDraft) -> Result<Saved<Note>, AppError> {
        if draft.title.trim().is_empty() {
            return Err(AppError::MissingField("Title"));
        }
        let note = Note {
            id: generate_id(),
            title: draft.title.trim().to_string(),
            content: draft.content.trim().to_string(),
            created_at: Utc::now(),
        };
        self.notes.push(note.clone());
        info!(id = %note.id, "note added");
        Ok(Saved {
            item: note,
            persisted: self.store.save_notes(&self.notes),
        })
    }

    /// Removes the note with `id`
    pub fn delete_note(&mut self, id: &str) -> Result<Saved<Note>, AppError> {
        let index = self
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))?;
        let removed = self.notes.remove(index);

        info!(id, "note deleted");
        Ok(Saved {
            item: removed,
            persisted: self.store.save_notes(&self.notes),
        })
    }

    /// Sets the search term and returns to the first page
    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.current_page = 1;
        self.persist_pagination();
    }

    /// Sets the completed-only filter and returns to the first page
    pub fn set_completed_only(&mut self, completed_only: bool) {
        self.completed_only = completed_only;
        self.current_page = 1;
        self.persist_pagination();
    }

    /// Flips the completed-only filter, returning the new state
    pub fn toggle_completed_filter(&mut self) -> bool {
        self.set_completed_only(!self.completed_only);
        self.completed_only
    }

    /// Moves to `page`; out-of-range pages are ignored
    pub fn change_page(&mut self, page: usize) -> bool {
        if !self.page().contains(page) {
            return false;
        }
        self.current_page = page;
        self.persist_pagination();
        true
    }

    pub fn next_page(&mut self) -> bool {
        let page = self.page();
        page.has_next() && self.change_page(page.current + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        let page = self.page();
        page.has_prev() && self.change_page(page.current - 1)
    }

    /// Routes passing the search term, then the completed filter
    pub fn filtered_routes(&self) -> Vec<&Route> {
        let term = self.search.trim().to_lowercase();
        self.routes
            .iter()
            .filter(|r| term.is_empty() || r.matches(&term))
            .filter(|r| !self.completed_only || r.completed)
            .collect()
    }

    /// Pagination for the current filter state
    pub fn page(&self) -> Page {
        Page::compute(
            self.filtered_routes().len(),
            self.page_size,
            self.current_page,
        )
    }

    /// The routes on the current page
    pub fn visible_routes(&self) -> RoutePage<'_> {
        let filtered = self.filtered_routes();
        let page = Page::compute(filtered.len(), self.page_size, self.current_page);
        let range = page.range();
        let items = filtered[range.clone()]
            .iter()
            .enumerate()
            .map(|(i, route)| (range.start + i + 1, *route))
            .collect();
        RoutePage { page, items }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            total_routes: self.routes.len(),
            completed_routes: self.routes.iter().filter(|r| r.completed).count(),
            total_notes: self.notes.len(),
        }
    }

    /// Looks up weather for `city` and caches the report
    ///
    /// The report is cached under `weather_{city}` whether it is live or demo.
    pub async fn lookup_weather(
        &self,
        client: &WeatherClient,
        city: &str,
    ) -> Result<Fetched<WeatherReport>, AppError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AppError::EmptyCity);
        }
        let result = client.get_weather(city).await;
        self.cache
            .put(&weather_cache_key(city), result.data(), self.weather_ttl);
        Ok(result)
    }

    fn persist_pagination(&self) {
        if !self.persist_view {
            return;
        }
        let settings = PaginationSettings {
            current_page: self.current_page,
            page_size: self.page_size,
            total_items: self.routes.len(),
        };
        self.store.save_settings(&settings);
    }
}

/// Cache key for a weather lookup
pub fn weather_cache_key(city: &str) -> String {
    format!("weather_{}", city)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreKey;
    use reqwest::Client;
    use tempfile::TempDir;

    fn create_tracker() -> (Tracker, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::new(temp_dir.path().to_path_buf());
        (
            Tracker::open(store, 5, Duration::from_secs(600)),
            temp_dir,
        )
    }

    fn draft(name: &str, destination: &str) -> RouteDraft {
        RouteDraft {
            name: name.to_string(),
            destination: destination.to_string(),
            ..Default::default()
        }
    }

    fn add(tracker: &mut Tracker, name: &str, destination: &str, completed: bool) -> Route {
        let mut d = draft(name, destination);
        d.completed = completed;
        tracker.add_route(&d).unwrap().item
    }

    #[test]
    fn test_add_route_persists_whole_collection() {
        let (mut tracker, temp_dir) = create_tracker();
        let saved = tracker.add_route(&draft("  Carpathians ", "Yaremche")).unwrap();

        assert!(saved.persisted);
        assert_eq!(saved.item.name, "Carpathians");
        assert_eq!(saved.item.created_at, saved.item.updated_at);

        let reopened = Tracker::open(
            Store::new(temp_dir.path().to_path_buf()),
            5,
            Duration::from_secs(600),
        );
        assert_eq!(reopened.routes(), tracker.routes());
    }

    #[test]
    fn test_add_route_validation() {
        let (mut tracker, _temp_dir) = create_tracker();

        assert_eq!(
            tracker.add_route(&draft(" ", "Lviv")).unwrap_err(),
            AppError::MissingField("Name")
        );
        assert_eq!(
            tracker.add_route(&draft("Trip", "")).unwrap_err(),
            AppError::MissingField("Destination")
        );

        let mut bad_date = draft("Trip", "Lviv");
        bad_date.start_date = "01.07.2025".to_string();
        assert!(matches!(
            tracker.add_route(&bad_date),
            Err(AppError::InvalidDate { field: "start date", .. })
        ));

        let mut reversed = draft("Trip", "Lviv");
        reversed.start_date = "2025-07-10".to_string();
        reversed.end_date = "2025-07-01".to_string();
        assert_eq!(tracker.add_route(&reversed).unwrap_err(), AppError::DateOrder);

        assert!(tracker.routes().is_empty());
    }

    #[test]
    fn test_update_route_keeps_identity() {
        let (mut tracker, _temp_dir) = create_tracker();
        let original = add(&mut tracker, "Old", "Kyiv", false);

        let mut edit = RouteDraft::from_route(&original);
        edit.name = "New".to_string();
        edit.start_date = "2025-08-01".to_string();
        edit.transport = Transport::Plane;
        edit.completed = true;
        let updated = tracker.update_route(&original.id, &edit).unwrap().item;

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);
        assert_eq!(updated.name, "New");
        assert_eq!(updated.start_date, NaiveDate::from_ymd_opt(2025, 8, 1));
        assert_eq!(updated.transport, Transport::Plane);
        assert_eq!(tracker.routes().len(), 1);
    }

    #[test]
    fn test_update_unknown_route() {
        let (mut tracker, _temp_dir) = create_tracker();
        let result = tracker.update_route("nope", &draft("A", "B"));
        assert_eq!(result.unwrap_err(), AppError::RouteNotFound("nope".to_string()));
    }

    #[test]
    fn test_delete_route_removes_exactly_one_and_keeps_order() {
        let (mut tracker, _temp_dir) = create_tracker();
        let a = add(&mut tracker, "A", "x", false);
        let b = add(&mut tracker, "B", "x", false);
        let c = add(&mut tracker, "C", "x", false);
        let d = add(&mut tracker, "D", "x", false);

        let removed = tracker.delete_route(&b.id).unwrap();
        assert_eq!(removed.item.id, b.id);

        let ids: Vec<&str> = tracker.routes().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), c.id.as_str(), d.id.as_str()]);

        assert_eq!(
            tracker.delete_route(&b.id).unwrap_err(),
            AppError::RouteNotFound(b.id.clone())
        );
        assert_eq!(tracker.routes().len(), 3);
    }

    #[test]
    fn test_notes_add_and_delete() {
        let (mut tracker, temp_dir) = create_tracker();
        assert_eq!(
            tracker.add_note(&NoteDraft::default()).unwrap_err(),
            AppError::MissingField("Title")
        );

        let first = tracker
            .add_note(&NoteDraft {
                title: "Visa".to_string(),
                content: "Check embassy hours".to_string(),
            })
            .unwrap()
            .item;
        let second = tracker
            .add_note(&NoteDraft {
                title: "Packing".to_string(),
                content: String::new(),
            })
            .unwrap()
            .item;

        tracker.delete_note(&first.id).unwrap();
        assert_eq!(tracker.notes(), &[second.clone()]);
        assert!(tracker.delete_note(&first.id).is_err());

        let store = Store::new(temp_dir.path().to_path_buf());
        assert_eq!(store.load_notes(), vec![second]);
    }

    #[test]
    fn test_search_then_completed_filter_compose() {
        let (mut tracker, _temp_dir) = create_tracker();
        add(&mut tracker, "Sea trip", "Odesa", true);
        add(&mut tracker, "Mountains", "Odesa region", false);
        add(&mut tracker, "City break", "Lviv", true);

        tracker.set_search("ODESA");
        assert_eq!(tracker.filtered_routes().len(), 2);

        tracker.set_completed_only(true);
        let names: Vec<&str> = tracker
            .filtered_routes()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["Sea trip"]);

        tracker.set_search("");
        assert_eq!(tracker.filtered_routes().len(), 2);
    }

    #[test]
    fn test_search_without_matches_has_one_page() {
        let (mut tracker, _temp_dir) = create_tracker();
        add(&mut tracker, "Trip", "Kyiv", false);

        tracker.set_search("zanzibar");
        let visible = tracker.visible_routes();
        assert!(visible.items.is_empty());
        assert_eq!(visible.page.total_pages, 1);
        assert_eq!(visible.page.current, 1);
    }

    #[test]
    fn test_pagination_over_filtered_routes() {
        let (mut tracker, _temp_dir) = create_tracker();
        for i in 0..12 {
            add(&mut tracker, &format!("Trip {}", i), "Kyiv", i % 2 == 0);
        }

        assert_eq!(tracker.page().total_pages, 3);
        assert!(tracker.change_page(3));
        let visible = tracker.visible_routes();
        assert_eq!(visible.items.len(), 2);
        assert_eq!(visible.items[0].0, 11);
        assert_eq!(visible.items[0].1.name, "Trip 10");

        assert!(!tracker.change_page(4));
        assert!(!tracker.change_page(0));

        // Filtering resets to the first page
        tracker.toggle_completed_filter();
        assert_eq!(tracker.page().current, 1);
        assert_eq!(tracker.page().total_pages, 2);
        assert!(!tracker.change_page(3));
    }

    #[test]
    fn test_next_and_prev_page() {
        let (mut tracker, _temp_dir) = create_tracker();
        for i in 0..6 {
            add(&mut tracker, &format!("Trip {}", i), "Kyiv", false);
        }
        assert!(!tracker.prev_page());
        assert!(tracker.next_page());
        assert_eq!(tracker.page().current, 2);
        assert!(!tracker.next_page());
        assert!(tracker.prev_page());
    }

    #[test]
    fn test_page_snapshot_is_restored() {
        let (mut tracker, temp_dir) = create_tracker();
        for i in 0..7 {
            add(&mut tracker, &format!("Trip {}", i), "Kyiv", false);
        }
        tracker.change_page(2);

        let store = Store::new(temp_dir.path().to_path_buf());
        let settings = store.load_settings();
        assert_eq!(settings.current_page, 2);
        assert_eq!(settings.total_items, 7);

        let reopened = Tracker::open(store, 5, Duration::from_secs(600));
        assert_eq!(reopened.page().current, 2);
    }

    #[test]
    fn test_detached_view_leaves_snapshot_alone() {
        let (mut tracker, temp_dir) = create_tracker();
        for i in 0..12 {
            add(&mut tracker, &format!("Trip {}", i), "Kyiv", false);
        }
        tracker.change_page(3);

        let store = Store::new(temp_dir.path().to_path_buf());
        let mut listing = Tracker::open(store.clone(), 5, Duration::from_secs(600));
        listing.detach_view();
        listing.set_search("trip 1");
        listing.set_completed_only(true);
        listing.change_page(1);

        assert_eq!(store.load_settings().current_page, 3);
    }

    #[test]
    fn test_open_keeps_routes_next_to_an_unreadable_one() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::new(temp_dir.path().to_path_buf());
        store
            .write_raw(
                StoreKey::Routes,
                r#"[{"id": "a", "name": "Kept A", "destination": "Lviv"},
                    {"id": "b", "name": "Bad", "destination": "Rivne", "startDate": "2025/07/01"}]"#,
            )
            .unwrap();

        let mut tracker = Tracker::open(store.clone(), 5, Duration::from_secs(600));
        assert_eq!(tracker.routes().len(), 1);

        tracker.add_route(&draft("New", "Odesa")).unwrap();
        let names: Vec<String> = store.load_routes().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Kept A".to_string(), "New".to_string()]);
    }

    #[test]
    fn test_stats() {
        let (mut tracker, _temp_dir) = create_tracker();
        add(&mut tracker, "A", "x", true);
        add(&mut tracker, "B", "x", false);
        tracker
            .add_note(&NoteDraft {
                title: "n".to_string(),
                content: String::new(),
            })
            .unwrap();

        assert_eq!(
            tracker.stats(),
            Stats {
                total_routes: 2,
                completed_routes: 1,
                total_notes: 1
            }
        );
    }

    #[test]
    fn test_mutation_reports_unsaved_changes() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();
        let mut tracker = Tracker::open(Store::new(blocker), 5, Duration::from_secs(600));

        let saved = tracker.add_route(&draft("A", "B")).unwrap();
        assert!(!saved.persisted);
        assert_eq!(tracker.routes().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_weather_rejects_blank_city() {
        let (tracker, _temp_dir) = create_tracker();
        let client = WeatherClient::with_endpoints(
            Client::new(),
            "http://127.0.0.1:9/forecast",
            "http://127.0.0.1:9/search",
        );
        let result = tracker.lookup_weather(&client, "   ").await;
        assert_eq!(result.unwrap_err(), AppError::EmptyCity);
    }

    #[tokio::test]
    async fn test_lookup_weather_caches_demo_result() {
        let (tracker, _temp_dir) = create_tracker();
        // Nothing listens on the discard port, so both steps fail fast
        let client = WeatherClient::with_endpoints(
            Client::new(),
            "http://127.0.0.1:9/forecast",
            "http://127.0.0.1:9/search",
        );

        let result = tracker.lookup_weather(&client, " Ternopil ").await.unwrap();
        assert!(result.is_fallback());

        let cached: WeatherReport = tracker.cache().get("weather_Ternopil").unwrap();
        assert_eq!(cached.city, "Ternopil");
        assert!(cached.is_demo());
        assert_eq!(cached.condition, result.data().condition);
    }
}
