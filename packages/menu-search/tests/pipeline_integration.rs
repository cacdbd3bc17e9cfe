//! Integration tests for the full search pipeline.
//!
//! These run the real locator, fetchers, and matcher against a local
//! HTTP server, with the browser/OCR/PDF engines mocked. The
//! directory and site finder are always mocked.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use menu_search::testing::{MockBrowserEngine, MockBrowserProvider, MockDirectory, MockPdfEngine};
use menu_search::{
    BrowserFetcher, CheckVerdict, DishChecker, DishMatcher, DishSearchResult, DishStatus,
    DomainLimiter, FetchConfig, HeuristicSiteFinder, ImageOcrFetcher, LocateConfig, MenuCache,
    MenuLocator, MenuPipeline, MenuSource, MockOcrEngine, PageImage, PdfFetcher, Place,
    SearchConfig, SearchOrchestrator, SharedBrowser, StaticFetcher,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("menu_search=debug")
        .with_test_writer()
        .try_init();
}

const FILLER: &str = "Добро пожаловать в наш уютный ресторан в самом центре города. \
    Мы работаем каждый день с двенадцати до полуночи и всегда рады гостям. \
    Здесь вы найдёте атмосферу, живую музыку по пятницам и внимательный персонал.";

fn menu_html() -> String {
    format!(
        "<html><body><h1>Меню ресторана</h1>\
         <p>Салат Цезарь — 450 ₽</p>\
         <p>Куриный суп с лапшой — 350 ₽</p>\
         <p>Борщ со сметаной — 290 ₽</p>\
         <p>Десерт дня — 200 руб</p>\
         <p>{FILLER}</p></body></html>"
    )
}

/// All the real components wired over mocks, per test.
struct TestStack {
    browser: Arc<MockBrowserEngine>,
    pdf: Arc<MockPdfEngine>,
    ocr: Arc<MockOcrEngine>,
    pipeline: Arc<MenuPipeline>,
}

fn build_stack(browser: MockBrowserEngine, pdf: MockPdfEngine, ocr: MockOcrEngine) -> TestStack {
    init_logging();
    let fetch_config = FetchConfig {
        server_error_delay: Duration::from_millis(5),
        pdf_min_text_len: 30,
        ..FetchConfig::default()
    };
    let locate_config = LocateConfig {
        min_content_len: 50,
        timeout: Duration::from_secs(10),
        ..LocateConfig::default()
    };
    let search_config = SearchConfig::default();

    let cache = MenuCache::new(
        Arc::new(menu_search::MemoryCache::new()),
        &fetch_config,
    );
    let limiter = Arc::new(DomainLimiter::unlimited());
    let static_fetcher = Arc::new(
        StaticFetcher::new(fetch_config.clone(), cache.clone(), limiter).expect("client"),
    );
    let browser = Arc::new(browser);
    let pdf = Arc::new(pdf);
    let ocr = Arc::new(ocr);
    let shared = Arc::new(SharedBrowser::new(Arc::new(MockBrowserProvider::new(
        browser.clone(),
    ))));
    let pdf_fetcher = Arc::new(PdfFetcher::new(
        static_fetcher.clone(),
        pdf.clone(),
        cache.clone(),
        fetch_config.clone(),
    ));
    let browser_fetcher = Arc::new(BrowserFetcher::new(
        shared.clone(),
        cache.clone(),
        fetch_config.clone(),
    ));
    let image_fetcher = Arc::new(ImageOcrFetcher::new(
        shared,
        ocr.clone(),
        cache,
        fetch_config,
    ));
    let locator = Arc::new(MenuLocator::new(
        static_fetcher.clone(),
        pdf_fetcher,
        browser_fetcher,
        image_fetcher,
        locate_config,
    ));
    let site_finder = Arc::new(HeuristicSiteFinder::new(
        static_fetcher,
        search_config.excluded_domains.clone(),
    ));
    let pipeline = Arc::new(MenuPipeline::new(
        site_finder,
        locator,
        DishMatcher::default(),
        search_config.excluded_domains,
    ));
    TestStack {
        browser,
        pdf,
        ocr,
        pipeline,
    }
}

fn place_with_site(id: &str, name: &str, site: &str) -> Place {
    Place::new(id, name, "ул. Тестовая 1", 55.75, 37.62).with_website(site)
}

async fn check(
    stack: &TestStack,
    place: &Place,
    dish: &str,
) -> (DishSearchResult, bool) {
    match stack.pipeline.check(place, dish).await {
        CheckVerdict::Checked {
            result,
            image_suspect,
        } => (result, image_suspect),
        CheckVerdict::Skipped => panic!("place unexpectedly skipped"),
    }
}

#[tokio::test]
async fn static_menu_page_yields_found_with_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(menu_html()))
        .mount(&server)
        .await;

    let stack = build_stack(
        MockBrowserEngine::new(),
        MockPdfEngine::new(),
        MockOcrEngine::new(),
    );
    let place = place_with_site("1", "Тестовая Пицца", &server.uri());
    let (result, _) = check(&stack, &place, "куриный суп").await;

    assert_eq!(result.status, DishStatus::Found);
    assert_eq!(result.menu_source, Some(MenuSource::StaticHtml));
    let item = result.menu_item.expect("menu item");
    assert_eq!(item.price, Some(350.0));
    assert_eq!(item.name, "куриный суп с лапшой");
    // The expensive strategies never ran.
    assert!(stack.browser.rendered().is_empty());
    assert_eq!(stack.pdf.ocr_calls(), 0);
    assert_eq!(stack.ocr.calls(), 0);
}

#[tokio::test]
async fn dish_without_price_is_found_no_price() {
    let server = MockServer::start().await;
    let html = format!(
        "<html><body><h1>Меню</h1>\
         <p>Салат и суп каждый день, свежие блюда</p>\
         <p>Куриный суп по домашнему рецепту</p>\
         <p>{FILLER}</p></body></html>"
    );
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let stack = build_stack(
        MockBrowserEngine::new(),
        MockPdfEngine::new(),
        MockOcrEngine::new(),
    );
    let place = place_with_site("1", "Суповая", &server.uri());
    let (result, _) = check(&stack, &place, "куриный суп").await;

    assert_eq!(result.status, DishStatus::FoundNoPrice);
    assert!(result.status.is_found());
    assert_eq!(result.menu_item.expect("item").price, None);
}

#[tokio::test]
async fn menu_found_but_dish_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(menu_html()))
        .mount(&server)
        .await;

    let stack = build_stack(
        MockBrowserEngine::new(),
        MockPdfEngine::new(),
        MockOcrEngine::new(),
    );
    let place = place_with_site("1", "Тестовая", &server.uri());
    let (result, suspect) = check(&stack, &place, "паста карбонара").await;

    assert_eq!(result.status, DishStatus::MenuUnavailable);
    assert!(!suspect);
    // The menu itself was located.
    assert!(result.menu_url.is_some());
}

#[tokio::test]
async fn menu_behind_scored_link() {
    let server = MockServer::start().await;
    let root = format!(
        "<html><body><p>{FILLER}</p>\
         <a href=\"/o-nas\">О нас</a>\
         <a href=\"/kitchen-page\">Наша кухня и блюда</a></body></html>"
    );
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(root))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/kitchen-page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(menu_html()))
        .mount(&server)
        .await;

    let stack = build_stack(
        MockBrowserEngine::new(),
        MockPdfEngine::new(),
        MockOcrEngine::new(),
    );
    let place = place_with_site("1", "Кухня", &server.uri());
    let (result, _) = check(&stack, &place, "борщ").await;

    assert_eq!(result.status, DishStatus::Found);
    assert!(result
        .menu_url
        .as_deref()
        .expect("menu url")
        .ends_with("/kitchen-page"));
    assert_eq!(result.menu_item.expect("item").price, Some(290.0));
}

#[tokio::test]
async fn pdf_linked_from_followed_page_is_parsed() {
    let server = MockServer::start().await;
    let root = format!(
        "<html><body><p>{FILLER}</p>\
         <a href=\"/kitchen\">Наша кухня и блюда</a></body></html>"
    );
    // The followed page is just a short download stub.
    let stub = "<html><body><p>Скачайте наш файл</p>\
         <a href=\"/files/menu.pdf\">Скачать PDF</a></body></html>";
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(root))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/kitchen"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stub))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/menu.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 kitchen-menu".to_vec()),
        )
        .mount(&server)
        .await;

    let pdf = MockPdfEngine::new().with_text_layer(
        &b"kitchen-menu"[..],
        "Меню\nБорщ со сметаной — 290 ₽\nСалат Цезарь — 450 ₽",
    );
    let stack = build_stack(MockBrowserEngine::new(), pdf, MockOcrEngine::new());
    let place = place_with_site("1", "Кухня", &server.uri());
    let (result, _) = check(&stack, &place, "борщ").await;

    assert_eq!(result.status, DishStatus::Found);
    assert_eq!(result.menu_source, Some(MenuSource::PdfText));
    assert!(result
        .menu_url
        .as_deref()
        .expect("menu url")
        .ends_with("/files/menu.pdf"));
    assert_eq!(result.menu_item.expect("item").price, Some(290.0));
}

#[tokio::test]
async fn page_naming_the_dish_is_accepted_without_menu_keywords() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><body><p>{FILLER}</p>\
             <p>Борщ со сметаной подаём каждый день</p></body></html>"
        )))
        .mount(&server)
        .await;

    let stack = build_stack(
        MockBrowserEngine::new(),
        MockPdfEngine::new(),
        MockOcrEngine::new(),
    );
    let place = place_with_site("1", "У Реки", &server.uri());
    let (result, _) = check(&stack, &place, "борщ").await;

    // The dish itself is the evidence; no fallback strategies run.
    assert_eq!(result.status, DishStatus::FoundNoPrice);
    assert_eq!(result.menu_source, Some(MenuSource::StaticHtml));
    assert!(stack.browser.rendered().is_empty());
    assert_eq!(stack.ocr.calls(), 0);
}

#[tokio::test]
async fn pdf_link_beats_html_candidates() {
    let server = MockServer::start().await;
    let root = format!(
        "<html><body><p>{FILLER}</p>\
         <a href=\"/files/menu.pdf\">Скачать меню</a></body></html>"
    );
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(root))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/menu.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4 menu-doc-a".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&server)
        .await;

    let pdf = MockPdfEngine::new().with_text_layer(
        &b"menu-doc-a"[..],
        "Меню. Куриный суп с лапшой 350 руб. Салат Цезарь 450 руб.",
    );
    let stack = build_stack(MockBrowserEngine::new(), pdf, MockOcrEngine::new());
    let place = place_with_site("1", "ПДФ Кафе", &server.uri());
    let (result, _) = check(&stack, &place, "куриный суп").await;

    assert_eq!(result.status, DishStatus::Found);
    assert_eq!(result.menu_source, Some(MenuSource::PdfText));
    assert_eq!(result.menu_item.expect("item").price, Some(350.0));
    // Text layer sufficed.
    assert_eq!(stack.pdf.ocr_calls(), 0);
}

#[tokio::test]
async fn scanned_pdf_falls_back_to_ocr() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/menu.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4 scanned-doc".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&server)
        .await;

    // No text layer scripted: extraction returns "", forcing OCR.
    let pdf = MockPdfEngine::new().with_ocr_text(
        &b"scanned-doc"[..],
        "Меню. Борщ со сметаной 290. Куриный суп 350.",
    );
    let stack = build_stack(MockBrowserEngine::new(), pdf, MockOcrEngine::new());
    let place = place_with_site("1", "Скан", &format!("{}/menu.pdf", server.uri()));
    let (result, _) = check(&stack, &place, "борщ").await;

    assert_eq!(result.status, DishStatus::Found);
    assert_eq!(result.menu_source, Some(MenuSource::PdfOcr));
    assert_eq!(stack.pdf.ocr_calls(), 1);
}

#[tokio::test]
async fn browser_fallback_for_script_rendered_site() {
    let server = MockServer::start().await;
    // The static root is an empty JS shell.
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><div id=\"app\"></div></body></html>"),
        )
        .mount(&server)
        .await;

    let root_url = format!("{}/", server.uri());
    let browser = MockBrowserEngine::new().with_page(&root_url, menu_html());
    let stack = build_stack(browser, MockPdfEngine::new(), MockOcrEngine::new());
    let place = place_with_site("1", "СПА Ресторан", &root_url);
    let (result, _) = check(&stack, &place, "куриный суп").await;

    assert_eq!(result.status, DishStatus::Found);
    assert_eq!(result.menu_source, Some(MenuSource::BrowserRender));
    assert_eq!(stack.browser.rendered(), vec![root_url]);
}

#[tokio::test]
async fn long_candidate_without_keywords_is_accepted_only_after_render() {
    let server = MockServer::start().await;
    let root = format!(
        "<html><body><p>{FILLER}</p>\
         <a href=\"/menu\">Наше меню</a></body></html>"
    );
    // The linked page never mentions a single indicator word, so the
    // static pass rejects it despite its length.
    let stub = "<html><body><p>Страница находится в разработке. Скоро здесь появится \
         подробная информация о нашем заведении, событиях и наших планах. \
         Следите за обновлениями на этой странице.</p></body></html>";
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(root.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/menu"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stub))
        .mount(&server)
        .await;

    let root_url = format!("{}/", server.uri());
    let menu_url = format!("{}/menu", server.uri());
    let browser = MockBrowserEngine::new()
        .with_page(&root_url, root)
        .with_page(&menu_url, stub);
    let stack = build_stack(browser, MockPdfEngine::new(), MockOcrEngine::new());
    let place = place_with_site("1", "Долгострой", &root_url);
    let (result, _) = check(&stack, &place, "борщ").await;

    // The page was taken as menu content, just without the dish.
    assert_eq!(result.status, DishStatus::MenuUnavailable);
    assert_eq!(result.menu_source, Some(MenuSource::BrowserRender));
    assert!(result.menu_url.as_deref().expect("menu url").ends_with("/menu"));
    // Static strategies ran first; the browser came last.
    assert_eq!(stack.browser.rendered(), vec![root_url, menu_url]);
}

#[tokio::test]
async fn unreadable_image_menu_is_flagged_as_suspect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("<html><body><p>{FILLER}</p></body></html>")),
        )
        .mount(&server)
        .await;

    let root_url = format!("{}/", server.uri());
    // Browser captures a menu-tagged image, but OCR reads nothing.
    let browser = MockBrowserEngine::new().with_images(
        &root_url,
        vec![PageImage {
            data: b"photo-of-menu".to_vec(),
            width: 900,
            height: 1200,
            alt: "меню".to_string(),
            src: "/img/menu.jpg".to_string(),
        }],
    );
    let stack = build_stack(browser, MockPdfEngine::new(), MockOcrEngine::new());
    let place = place_with_site("1", "Фото Меню", &root_url);
    let (result, suspect) = check(&stack, &place, "борщ").await;

    assert_eq!(result.status, DishStatus::MenuUnavailable);
    assert!(suspect);
    assert_eq!(stack.ocr.calls(), 1);
}

#[tokio::test]
async fn image_menu_read_by_ocr_yields_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("<html><body><p>{FILLER}</p></body></html>")),
        )
        .mount(&server)
        .await;

    let root_url = format!("{}/", server.uri());
    let browser = MockBrowserEngine::new().with_images(
        &root_url,
        vec![PageImage {
            data: b"photo-of-menu".to_vec(),
            width: 900,
            height: 1200,
            alt: "меню".to_string(),
            src: "/img/menu.jpg".to_string(),
        }],
    );
    let ocr = MockOcrEngine::new().with_text(
        &b"photo-of-menu"[..],
        "Меню: Куриный суп 350, Борщ 290, Салат Цезарь 450",
    );
    let stack = build_stack(browser, MockPdfEngine::new(), ocr);
    let place = place_with_site("1", "Фото Меню", &root_url);
    let (result, suspect) = check(&stack, &place, "куриный суп").await;

    assert_eq!(result.status, DishStatus::Found);
    assert_eq!(result.menu_source, Some(MenuSource::ImageOcr));
    assert!(!suspect);
}

#[tokio::test]
async fn place_without_any_website_is_site_not_found() {
    let stack = build_stack(
        MockBrowserEngine::new(),
        MockPdfEngine::new(),
        MockOcrEngine::new(),
    );
    // Short name, so no domain guesses are probed either.
    let place = Place::new("1", "Бар", "ул. Тестовая 2", 55.7, 37.6);
    let (result, _) = check(&stack, &place, "борщ").await;
    assert_eq!(result.status, DishStatus::SiteNotFound);
}

#[tokio::test]
async fn social_profile_only_place_is_skipped() {
    let stack = build_stack(
        MockBrowserEngine::new(),
        MockPdfEngine::new(),
        MockOcrEngine::new(),
    );
    let place =
        Place::new("1", "Бар", "ул. Тестовая 2", 55.7, 37.6).with_website("https://vk.com/bar");
    let verdict = stack.pipeline.check(&place, "борщ").await;
    assert!(matches!(verdict, CheckVerdict::Skipped));
}

#[tokio::test]
async fn full_search_over_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(menu_html()))
        .mount(&server)
        .await;

    let stack = build_stack(
        MockBrowserEngine::new(),
        MockPdfEngine::new(),
        MockOcrEngine::new(),
    );
    let directory = Arc::new(
        MockDirectory::new()
            .with_geocode("Москва, Арбат 1", 55.75, 37.59)
            .with_place(200, place_with_site("1", "Пиццерия", &server.uri()))
            // Name too short for domain guessing, so no real network
            // is touched for the siteless place.
            .with_place(200, Place::new("2", "Бар", "ул. Тихая 3", 55.75, 37.59)),
    );
    let orchestrator = SearchOrchestrator::new(
        directory,
        stack.pipeline.clone(),
        SearchConfig::new().with_target_count(1),
    );

    let report = orchestrator
        .search_at_address("куриный суп", "Москва, Арбат 1")
        .await
        .expect("search");

    assert_eq!(report.found.len(), 1);
    assert_eq!(report.found[0].place.id, "1");
    assert_eq!(report.found[0].status, DishStatus::Found);
    assert!(report.checked_count >= 1);
    assert_eq!(report.final_radius_m, 200);
}
