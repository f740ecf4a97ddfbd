//! End-to-end tests of the HTTP surface against the in-memory repository and
//! a local media store in a temporary directory.

use std::sync::Arc;

use ac_api::{router, AppState, FlashSigner, UploadRoute};
use ac_core::{Board, BoardRepo, MediaStore, MockBoardRepo};
use ac_db_memory::MemoryBoardRepo;
use ac_services::{BoardService, PostingRules, ThreadService};
use ac_storage_local::LocalMediaStore;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "altchan-test-boundary";

struct TestApp {
    app: Router,
    repo: Arc<MemoryBoardRepo>,
    uploads: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let repo = Arc::new(MemoryBoardRepo::new());
        for (tag, name) in [("b", "Random"), ("g", "Technology")] {
            repo.upsert_board(Board {
                tag: tag.to_string(),
                name: name.to_string(),
                nsfw: tag == "b",
            })
            .await
            .unwrap();
        }

        Self {
            app: build_router(repo.clone(), &uploads),
            repo,
            uploads,
        }
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn submit(&self, tag: &str, parts: &[Part<'_>]) -> Response {
        let request = Request::post(format!("/submit/{tag}/"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    fn stored_files(&self) -> Vec<String> {
        std::fs::read_dir(self.uploads.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect()
    }

    async fn post_count(&self) -> usize {
        let mut count = 0;
        for board in self.repo.list_boards().await.unwrap() {
            for thread in self.repo.list_threads(&board.tag).await.unwrap() {
                count += self.repo.list_posts(thread.id).await.unwrap().len();
            }
        }
        count
    }
}

/// The full application over `repo`, storing uploads in `uploads`.
fn build_router(repo: Arc<dyn BoardRepo>, uploads: &TempDir) -> Router {
    let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(
        uploads.path().to_path_buf(),
        "/images".to_string(),
    ));
    let rules = PostingRules {
        default_name: "Anonymous".to_string(),
        max_subject_length: 60,
        max_name_length: 30,
        max_email_length: 30,
        max_message_length: 200,
        allowed_extensions: vec!["jpg".into(), "jpeg".into(), "png".into(), "gif".into()],
    };

    let state = AppState {
        boards: Arc::new(BoardService::new(repo.clone())),
        threads: Arc::new(ThreadService::new(repo, media.clone(), rules)),
        media,
        flash: FlashSigner::new(b"test-secret").unwrap(),
    };
    let route = UploadRoute {
        directory: uploads.path().to_path_buf(),
        url_prefix: "/images".to_string(),
        max_bytes: 1024 * 1024,
    };
    router(state, &route)
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
                );
            }
            Part::File(filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"upload\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// The `name=value` part of the flash cookie set on a response.
fn flash_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("altchan_flash="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

fn clears_flash(response: &Response) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| v.to_str().unwrap().starts_with("altchan_flash=;"))
}

fn is_generated_name(name: &str, ext: &str) -> bool {
    let Some((stem, found_ext)) = name.rsplit_once('.') else {
        return false;
    };
    let Some((stamp, suffix)) = stem.split_once('_') else {
        return false;
    };
    found_ext == ext
        && stamp.len() == 14
        && stamp.bytes().all(|b| b.is_ascii_digit())
        && suffix.parse::<u32>().is_ok()
}

#[tokio::test]
async fn index_lists_every_board() {
    let app = TestApp::new().await;

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));

    let html = body_text(response).await;
    assert!(html.contains("/boards/b/"));
    assert!(html.contains("/boards/g/"));
    assert!(html.contains("Technology"));
}

#[tokio::test]
async fn unknown_board_is_404() {
    let app = TestApp::new().await;

    let response = app.get("/boards/zz/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("does not exist"));
}

#[tokio::test]
async fn valid_submission_creates_thread_post_and_file() {
    let app = TestApp::new().await;

    let response = app
        .submit(
            "b",
            &[
                Part::Text("subject", "First thread"),
                Part::Text("message", ">be me\nposting"),
                Part::File("photo.png", b"\x89PNG fake image"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/boards/b/");
    assert!(flash_cookie(&response).is_none());

    let threads = app.repo.list_threads("b").await.unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].subject.as_deref(), Some("First thread"));
    let posts = app.repo.list_posts(threads[0].id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].thread_id, threads[0].id);
    assert_eq!(posts[0].name, "Anonymous");

    let files = app.stored_files();
    assert_eq!(files.len(), 1);
    assert!(is_generated_name(&files[0], "png"), "{}", files[0]);
    assert_eq!(posts[0].filename.as_deref(), Some(files[0].as_str()));

    // The board page shows the post and links the image, which is served back.
    let html = body_text(app.get("/boards/b/", None).await).await;
    let image_url = format!("/images/{}", files[0]);
    assert!(html.contains(&image_url));
    assert!(html.contains("First thread"));
    assert!(html.contains("<span class=\"greentext\">&gt;be me</span>"));

    let image = app.get(&image_url, None).await;
    assert_eq!(image.status(), StatusCode::OK);
    let served = to_bytes(image.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&served[..], b"\x89PNG fake image");
}

#[tokio::test]
async fn blank_submission_flashes_both_errors_and_writes_nothing() {
    let app = TestApp::new().await;

    let response = app.submit("b", &[Part::Text("message", "   ")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/boards/b/");
    let cookie = flash_cookie(&response).expect("flash cookie");

    assert_eq!(app.post_count().await, 0);
    assert!(app.repo.list_threads("b").await.unwrap().is_empty());
    assert!(app.stored_files().is_empty());

    let page = app.get("/boards/b/", Some(&cookie)).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(clears_flash(&page), "flash cookie should be cleared once shown");

    let html = body_text(page).await;
    assert!(html.contains("You must enter a message."));
    assert!(html.contains("You must upload a file to start a thread."));
}

#[tokio::test]
async fn long_message_is_rejected() {
    let app = TestApp::new().await;
    let message = "x".repeat(201);

    let response = app
        .submit(
            "g",
            &[Part::Text("message", &message), Part::File("photo.png", b"png")],
        )
        .await;

    let cookie = flash_cookie(&response).expect("flash cookie");
    assert_eq!(app.post_count().await, 0);
    assert!(app.stored_files().is_empty());

    let html = body_text(app.get("/boards/g/", Some(&cookie)).await).await;
    assert!(html.contains("Message is too long"));
}

#[tokio::test]
async fn disallowed_extension_is_rejected_even_with_a_good_message() {
    let app = TestApp::new().await;

    let response = app
        .submit(
            "b",
            &[Part::Text("message", "perfectly fine"), Part::File("virus.exe", b"MZ")],
        )
        .await;

    let cookie = flash_cookie(&response).expect("flash cookie");
    assert_eq!(app.post_count().await, 0);
    assert!(app.stored_files().is_empty());

    let html = body_text(app.get("/boards/b/", Some(&cookie)).await).await;
    assert!(html.contains("is not allowed"));
    assert!(!html.contains("You must enter a message."));
}

#[tokio::test]
async fn long_name_is_truncated_and_email_kept() {
    let app = TestApp::new().await;
    let name = "n".repeat(45);

    app.submit(
        "b",
        &[
            Part::Text("name", &name),
            Part::Text("email", "sage"),
            Part::Text("message", "hi"),
            Part::File("cat.JPG", b"jpeg"),
        ],
    )
    .await;

    let thread = &app.repo.list_threads("b").await.unwrap()[0];
    let post = &app.repo.list_posts(thread.id).await.unwrap()[0];
    assert_eq!(post.name, "n".repeat(30));
    assert_eq!(post.email.as_deref(), Some("sage"));
    assert!(is_generated_name(post.filename.as_deref().unwrap(), "jpg"));
}

#[tokio::test]
async fn threads_stay_on_their_own_board() {
    let app = TestApp::new().await;

    for tag in ["b", "g", "b"] {
        let response = app
            .submit(tag, &[Part::Text("message", tag), Part::File("a.gif", b"gif")])
            .await;
        assert_eq!(location(&response), format!("/boards/{tag}/"));
    }

    let on_b = app.repo.list_threads("b").await.unwrap();
    let on_g = app.repo.list_threads("g").await.unwrap();
    assert_eq!(on_b.len(), 2);
    assert_eq!(on_g.len(), 1);
    assert!(on_b.iter().all(|t| t.board_tag == "b"));

    // Three files with three distinct names.
    assert_eq!(app.stored_files().len(), 3);
}

#[tokio::test]
async fn submission_to_unknown_board_is_404_and_saves_nothing() {
    let app = TestApp::new().await;

    let response = app
        .submit("zz", &[Part::Text("message", "hi"), Part::File("a.png", b"png")])
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn forged_flash_cookie_is_ignored() {
    let app = TestApp::new().await;

    let response = app
        .get("/boards/b/", Some("altchan_flash=WyJoaSJd.bm90LWEtc2lnbmF0dXJl"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(!html.contains("class=\"flash\""));
}

#[tokio::test]
async fn placeholder_routes_answer_with_text() {
    let app = TestApp::new().await;

    let thread = body_text(app.get("/boards/b/12/", None).await).await;
    assert_eq!(thread, "Visiting thread 12 on board b");

    let reply = body_text(app.get("/submit/b/12", None).await).await;
    assert_eq!(reply, "Submitting post to thread 12 on board b");
}

#[tokio::test]
async fn rejected_post_to_unknown_board_does_not_leak_messages() {
    let app = TestApp::new().await;

    let response = app.submit("zz", &[Part::Text("message", "   ")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/boards/zz/");
    let cookie = flash_cookie(&response).expect("flash cookie");

    let missing = app.get("/boards/zz/", Some(&cookie)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(clears_flash(&missing), "the 404 page must consume pending messages");

    // The browser drops the cleared cookie, so the next board starts clean.
    let html = body_text(app.get("/boards/g/", None).await).await;
    assert!(!html.contains("You must enter a message."));
}

#[tokio::test]
async fn storage_failure_is_a_generic_500() {
    let uploads = tempfile::tempdir().unwrap();
    let mut repo = MockBoardRepo::new();
    repo.expect_list_boards()
        .returning(|| Err(anyhow::anyhow!("connection to db.internal:5432 refused")));
    repo.expect_get_board()
        .returning(|_| Err(anyhow::anyhow!("connection to db.internal:5432 refused")));
    let app = build_router(Arc::new(repo), &uploads);

    for uri in ["/", "/boards/b/"] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        let body = body_text(response).await;
        assert_eq!(body, "Internal Server Error");
        assert!(!body.contains("db.internal"));
    }
}
