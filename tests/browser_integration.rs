//! Integration test for the browser tool.
//!
//! Requires Chrome installed. Run with:
//!   cargo test --test browser_integration -- --nocapture

use pagemapper::context::JobContext;
use pagemapper::tool::Tool;
use pagemapper::tools::builtin::{BrowserTool, find_chrome};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_browser_navigate_click_and_screenshot() {
    // Skip if Chrome/Chromium is not installed (works on macOS, Linux, Windows).
    if find_chrome().is_none() {
        eprintln!("Skipping: Chrome not found");
        return;
    }

    let tool = BrowserTool::new("integration-test");
    let ctx = JobContext::new("integration-test");

    // 1. Navigate to Wikipedia.
    eprintln!("=== Navigating to Wikipedia...");
    let nav_result = tool
        .execute(
            serde_json::json!({
                "action": "navigate",
                "url": "https://en.wikipedia.org/wiki/Mariam_Almheiri"
            }),
            &ctx,
        )
        .await;

    let nav_output = match nav_result {
        Ok(output) => output,
        Err(e) => panic!("navigation should succeed, got: {e}"),
    };

    eprintln!(
        "Navigation result: {}",
        serde_json::to_string_pretty(&nav_output.content).unwrap()
    );
    let title = nav_output
        .content
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or("");
    assert!(
        title.contains("Mariam") || title.contains("Almheiri"),
        "page title should mention Mariam Almheiri, got: {title}"
    );

    // 2. Navigation folds a page map in directly — no separate "read page" call.
    let interactive_text = nav_output
        .content
        .get("interactiveText")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let content_text = nav_output
        .content
        .get("contentText")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    eprintln!(
        "interactiveText: {} lines, contentText: {} lines",
        interactive_text.lines().count(),
        content_text.lines().count()
    );
    assert!(
        content_text.lines().count() > 3,
        "an article page should yield more than a handful of content lines"
    );

    // 3. Scroll partway down the page, which also returns a refreshed map.
    eprintln!("\n=== Scrolling...");
    let scroll_result = tool
        .execute(
            serde_json::json!({"action": "scroll", "direction": "down", "amount": 5}),
            &ctx,
        )
        .await;
    assert!(scroll_result.is_ok(), "scroll should succeed");

    // 4. Evaluate arbitrary JS.
    eprintln!("\n=== Getting page dimensions via eval_js...");
    let dims_result = tool
        .execute(
            serde_json::json!({
                "action": "eval_js",
                "expression": "JSON.stringify({w: window.innerWidth, h: window.innerHeight})"
            }),
            &ctx,
        )
        .await;
    assert!(dims_result.is_ok(), "eval_js should succeed");

    // 5. Take a full-page screenshot.
    eprintln!("\n=== Taking screenshot...");
    let screenshot_result = tool
        .execute(serde_json::json!({"action": "screenshot"}), &ctx)
        .await;

    match screenshot_result {
        Ok(output) => {
            let b64 = output
                .content
                .get("data")
                .and_then(|d| d.as_str())
                .unwrap_or("");
            assert!(!b64.is_empty(), "screenshot should return base64 data");
            eprintln!(
                "Screenshot: {} base64 chars ({} bytes decoded)",
                b64.len(),
                b64.len() * 3 / 4
            );
        }
        Err(e) => panic!("screenshot should succeed, got: {e}"),
    }

    // 6. Extract text from a selector to verify content actually loaded.
    eprintln!("\n=== Extracting page text...");
    let extract_result = tool
        .execute(
            serde_json::json!({"action": "extract", "selector": "h1"}),
            &ctx,
        )
        .await;

    match extract_result {
        Ok(output) => {
            let text = output.display_text.unwrap_or_default();
            eprintln!("H1 text: {text}");
            assert!(
                text.contains("Mariam") || text.contains("Almheiri"),
                "H1 should contain the article subject, got: {text}"
            );
        }
        Err(e) => panic!("extract should succeed, got: {e}"),
    }

    // 7. Click a real link (the first interactive ref, if the page map found one)
    //    then confirm the click action itself folds a fresh map back in.
    if let Some(first_ref) = interactive_text
        .lines()
        .find_map(|line| line.split("ref=\"").nth(1))
        .and_then(|rest| rest.split('"').next())
    {
        eprintln!("\n=== Clicking ref={first_ref}...");
        let click_result = tool
            .execute(
                serde_json::json!({"action": "click", "ref": first_ref}),
                &ctx,
            )
            .await;
        assert!(click_result.is_ok(), "click by ref should succeed");
    } else {
        eprintln!("\n=== No interactive ref found to click, skipping click step");
    }

    // 8. Go back in history.
    eprintln!("\n=== Navigating back...");
    let back_result = tool.execute(serde_json::json!({"action": "back"}), &ctx).await;
    assert!(back_result.is_ok(), "back should succeed");

    eprintln!("\n=== All browser integration tests passed!");
}
