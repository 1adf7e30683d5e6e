use snapshot_kit_core::{BatchReport, Route, write_artifact};
use snapshot_kit_generator::strip_scripts;
use snapshot_kit_renderer::Renderer;
use std::path::Path;

/// Render and sanitize every route strictly in order, then write the
/// artifacts.
///
/// Nothing is written until every route has rendered, so the host keeps
/// serving the untouched entry documents for the whole batch. A failing route
/// is logged and recorded, then the next route runs; the batch itself never
/// fails.
pub async fn render_routes<R>(
    renderer: &mut R,
    base_url: &str,
    routes: &[Route],
    root: &Path,
) -> BatchReport
where
    R: Renderer + ?Sized,
{
    let mut report = BatchReport::default();
    let mut rendered = Vec::with_capacity(routes.len());

    for route in routes {
        tracing::info!("Fully rendering route: {}", route);
        match render_route(renderer, base_url, route).await {
            Ok(html) => rendered.push((route, html)),
            Err(e) => report.record_failure(route, &e),
        }
    }

    for (route, html) in rendered {
        let path = route.output_path(root);
        match write_artifact(&path, &html) {
            Ok(()) => report.record_written(route, path),
            Err(e) => report.record_failure(route, &e),
        }
    }

    report
}

async fn render_route<R>(
    renderer: &mut R,
    base_url: &str,
    route: &Route,
) -> snapshot_kit_core::Result<String>
where
    R: Renderer + ?Sized,
{
    let document = renderer.render(&route.url(base_url)).await?;
    strip_scripts(&document.html)
}
