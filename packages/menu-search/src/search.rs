//! Progressive-radius search orchestration.
//!
//! Expands the search radius in steps, pulls nearby places from the
//! directory, and dispatches each new place to the dish-checking
//! pipeline with bounded concurrency. Stops as soon as enough places
//! with the dish are found or the radius ceiling is reached. Places
//! are deduplicated by directory id across radius steps, so a venue
//! returned at 200m is not re-checked at 400m.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::dish::DishMatcher;
use crate::error::{MenuSearchError, Result};
use crate::locate::{LocateOutcome, MenuLocator};
use crate::sites::is_excluded_domain;
use crate::traits::{PlaceDirectory, SiteFinder};
use crate::types::{DishSearchRequest, DishSearchResult, DishStatus, Place, SearchReport};

/// Progress notifications emitted while a search runs.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    /// The search moved to a wider radius.
    RadiusExpanded { radius_m: u32 },

    /// One place finished checking.
    PlaceChecked {
        place_name: String,
        status: DishStatus,
    },
}

/// Callback invoked for each [`SearchEvent`].
pub type ProgressFn = Arc<dyn Fn(SearchEvent) + Send + Sync>;

/// Verdict of checking one place for one dish.
#[derive(Debug, Clone)]
pub enum CheckVerdict {
    /// The place resolves only to an excluded domain (social network,
    /// aggregator); it does not count as checked.
    Skipped,

    /// The place was checked end to end.
    Checked {
        result: DishSearchResult,
        /// Menu-like images were present but unreadable; the result
        /// is worth surfacing as a "look yourself" link.
        image_suspect: bool,
    },
}

/// The per-place unit of work: website resolution, menu location,
/// dish matching.
#[async_trait]
pub trait DishChecker: Send + Sync {
    async fn check(&self, place: &Place, dish_name: &str) -> CheckVerdict;
}

/// Production [`DishChecker`] wiring the real collaborators together.
pub struct MenuPipeline {
    site_finder: Arc<dyn SiteFinder>,
    locator: Arc<MenuLocator>,
    matcher: DishMatcher,
    excluded_domains: Vec<String>,
}

impl MenuPipeline {
    pub fn new(
        site_finder: Arc<dyn SiteFinder>,
        locator: Arc<MenuLocator>,
        matcher: DishMatcher,
        excluded_domains: Vec<String>,
    ) -> Self {
        Self {
            site_finder,
            locator,
            matcher,
            excluded_domains,
        }
    }
}

#[async_trait]
impl DishChecker for MenuPipeline {
    async fn check(&self, place: &Place, dish_name: &str) -> CheckVerdict {
        let site = match self.site_finder.find_website(place).await {
            Some(site) => site,
            None => {
                // A place whose only known URL is a social profile is
                // noise, not a negative result.
                let excluded_only = place
                    .website
                    .as_deref()
                    .is_some_and(|w| is_excluded_domain(w, &self.excluded_domains));
                if excluded_only {
                    debug!(place = %place.name, "skipping place with excluded-domain website");
                    return CheckVerdict::Skipped;
                }
                return CheckVerdict::Checked {
                    result: DishSearchResult::site_not_found(place.clone()),
                    image_suspect: false,
                };
            }
        };
        if is_excluded_domain(&site, &self.excluded_domains) {
            debug!(place = %place.name, url = %site, "skipping excluded domain");
            return CheckVerdict::Skipped;
        }

        match self.locator.locate(&site, dish_name).await {
            LocateOutcome::Found(located) => {
                let matched = self.matcher.match_dish(dish_name, &located.content.text);
                if !matched.found {
                    let mut result = DishSearchResult::menu_unavailable(
                        place.clone(),
                        format!("menu found, dish not in it: {dish_name}"),
                    );
                    result.menu_url = Some(located.menu_url);
                    result.menu_source = Some(located.content.source);
                    return CheckVerdict::Checked {
                        result,
                        image_suspect: false,
                    };
                }
                let status = if matched.price.is_some() {
                    DishStatus::Found
                } else {
                    DishStatus::FoundNoPrice
                };
                let item = self
                    .matcher
                    .menu_item(dish_name, &located.content.text, &matched);
                CheckVerdict::Checked {
                    result: DishSearchResult {
                        place: place.clone(),
                        status,
                        menu_url: Some(located.menu_url),
                        menu_item: item,
                        menu_source: Some(located.content.source),
                        error_message: None,
                    },
                    image_suspect: false,
                }
            }
            LocateOutcome::ImageMenuSuspect { url } => {
                let mut result = DishSearchResult::menu_unavailable(
                    place.clone(),
                    "menu appears to be image-based and could not be read",
                );
                result.menu_url = Some(url);
                CheckVerdict::Checked {
                    result,
                    image_suspect: true,
                }
            }
            LocateOutcome::NotFound { reason } => CheckVerdict::Checked {
                result: DishSearchResult::menu_unavailable(place.clone(), reason),
                image_suspect: false,
            },
        }
    }
}

/// Drives one dish search from a point outward.
pub struct SearchOrchestrator {
    directory: Arc<dyn PlaceDirectory>,
    checker: Arc<dyn DishChecker>,
    config: SearchConfig,
}

impl SearchOrchestrator {
    pub fn new(
        directory: Arc<dyn PlaceDirectory>,
        checker: Arc<dyn DishChecker>,
        config: SearchConfig,
    ) -> Self {
        Self {
            directory,
            checker,
            config,
        }
    }

    /// Search around a free-form address. Fails when the address
    /// cannot be geocoded.
    pub async fn search_at_address(&self, dish_name: &str, address: &str) -> Result<SearchReport> {
        let (lat, lon) = self
            .directory
            .geocode(address)
            .await?
            .ok_or_else(|| MenuSearchError::Directory("address could not be geocoded".into()))?;
        self.search(&DishSearchRequest::new(dish_name, lat, lon))
            .await
    }

    /// Search around a point.
    pub async fn search(&self, request: &DishSearchRequest) -> Result<SearchReport> {
        self.search_with_progress(request, None).await
    }

    /// Search around a point, reporting progress.
    pub async fn search_with_progress(
        &self,
        request: &DishSearchRequest,
        progress: Option<ProgressFn>,
    ) -> Result<SearchReport> {
        let report = Mutex::new(SearchReport::default());
        let found_count = AtomicUsize::new(0);
        let mut seen: HashSet<String> = HashSet::new();
        let step = self.config.radius_step_m.max(1);
        let mut radius = step.min(self.config.max_radius_m);
        let limiter = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));

        info!(dish = %request.dish_name, lat = request.lat, lon = request.lon, "starting dish search");
        'radius: loop {
            emit(&progress, SearchEvent::RadiusExpanded { radius_m: radius });
            let places = self
                .directory
                .search_nearby(request.lat, request.lon, radius, self.config.directory_limit)
                .await?;
            let fresh: Vec<Place> = places
                .into_iter()
                .filter(|p| seen.insert(p.id.clone()))
                .collect();
            debug!(radius_m = radius, fresh = fresh.len(), "directory returned places");

            // The whole radius batch is dispatched together; the
            // semaphore keeps at most `max_concurrent` checks in
            // flight, and a place whose permit arrives after the
            // target is already met is not checked at all. Results
            // land in the report (and fire the progress callback) the
            // moment each place finishes, not at the batch join.
            let report = &report;
            let found_count = &found_count;
            join_all(fresh.iter().map(|place| {
                let limiter = Arc::clone(&limiter);
                let progress = progress.clone();
                async move {
                    if found_count.load(Ordering::SeqCst) >= self.config.target_count {
                        return;
                    }
                    let _permit = limiter.acquire().await;
                    if found_count.load(Ordering::SeqCst) >= self.config.target_count {
                        return;
                    }
                    let verdict = self.checker.check(place, &request.dish_name).await;
                    let CheckVerdict::Checked {
                        result,
                        image_suspect,
                    } = verdict
                    else {
                        return;
                    };
                    emit(
                        &progress,
                        SearchEvent::PlaceChecked {
                            place_name: result.place.name.clone(),
                            status: result.status,
                        },
                    );
                    let mut report = report.lock().unwrap();
                    report.checked_count += 1;
                    if result.status.is_found() {
                        found_count.fetch_add(1, Ordering::SeqCst);
                        report.found.push(result);
                    } else {
                        if image_suspect {
                            report.image_menu_suspects.push(result.clone());
                        }
                        report.checked_not_found.push(result);
                    }
                }
            }))
            .await;
            if found_count.load(Ordering::SeqCst) >= self.config.target_count {
                info!(found = found_count.load(Ordering::SeqCst), radius_m = radius, "target reached");
                break 'radius;
            }

            if radius >= self.config.max_radius_m {
                break;
            }
            radius = (radius + step).min(self.config.max_radius_m);
        }

        let mut report = report.into_inner().unwrap();
        report.final_radius_m = radius;
        info!(
            found = report.found.len(),
            checked = report.checked_count,
            final_radius_m = radius,
            "search finished"
        );
        Ok(report)
    }
}

fn emit(progress: &Option<ProgressFn>, event: SearchEvent) {
    if let Some(f) = progress {
        f(event);
    }
}
