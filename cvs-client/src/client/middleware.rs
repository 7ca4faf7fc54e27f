//! Middleware used by the default [`Client`](crate::Client) stack.
use http::{Request, Uri};
use tower::util::MapRequestLayer;

use super::Body;
use crate::{Config, Result};

/// Layer that roots every request under the project's locations collection.
///
/// The [`Client`](crate::Client) sends paths such as `/us-west2/Volumes`. Behind this layer they
/// reach `{host}/v2/projects/{project}/locations/us-west2/Volumes`.
///
/// # Errors
///
/// Fails when the host and project do not form a valid URI.
pub fn project_scope(
    config: &Config,
) -> Result<MapRequestLayer<impl Fn(Request<Body>) -> Request<Body> + Clone>> {
    let root = config.base_uri()?.to_string().trim_end_matches('/').to_owned();
    Ok(MapRequestLayer::new(move |req: Request<Body>| scoped(&root, req)))
}

fn scoped(root: &str, req: Request<Body>) -> Request<Body> {
    let (mut parts, body) = req.into_parts();
    let tail = parts.uri.path_and_query().map_or("", |pq| pq.as_str());
    match format!("{root}{tail}").parse::<Uri>() {
        Ok(uri) => parts.uri = uri,
        Err(e) => tracing::warn!(path = tail, "request left unscoped: {}", e),
    }
    Request::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::{service_fn, Layer, ServiceExt};

    fn uri_of(root: &str, path: &str) -> String {
        let req = Request::get(path).body(Body::empty()).unwrap();
        scoped(root, req).uri().to_string()
    }

    #[test]
    fn paths_land_under_the_project() {
        let root = "https://cloudvolumesgcp-api.netapp.com/v2/projects/123/locations";
        assert_eq!(
            uri_of(root, "/us-west2/Volumes/abc"),
            "https://cloudvolumesgcp-api.netapp.com/v2/projects/123/locations/us-west2/Volumes/abc"
        );
        assert_eq!(
            uri_of(root, "/us-east4/Volumes?limit=5"),
            "https://cloudvolumesgcp-api.netapp.com/v2/projects/123/locations/us-east4/Volumes?limit=5"
        );
    }

    #[tokio::test]
    async fn layer_scopes_to_the_configured_host() {
        let config = Config::new("42").with_host("http://localhost:8080/").unwrap();
        let svc = project_scope(&config).unwrap().layer(service_fn(|req: Request<Body>| async move {
            Ok::<_, tower::BoxError>(req.uri().to_string())
        }));
        let req = Request::delete("/us-east4/Volumes/v1").body(Body::empty()).unwrap();
        assert_eq!(
            svc.oneshot(req).await.unwrap(),
            "http://localhost:8080/v2/projects/42/locations/us-east4/Volumes/v1"
        );
    }
}
