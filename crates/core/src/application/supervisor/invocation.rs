// Invocation construction - resolves a request into the exact renderer
// arguments.

use std::path::Path;

use crate::domain::PosterRequest;
use crate::port::{RenderExtent, RenderInvocation};

/// Size preset used when the caller picked neither a size nor a
/// distance. Bounds memory use on large metros.
pub const DEFAULT_SIZE_PRESET: &str = "city";

/// The preset value meaning "no explicit size chosen".
const SIZE_AUTO: &str = "auto";

/// Resolve the render extent. Exactly one of a size preset or a
/// distance is ever produced:
/// 1. an explicit, non-"auto" size wins;
/// 2. without a distance, the conservative default preset applies;
/// 3. otherwise the distance is passed verbatim.
pub fn resolve_extent(request: &PosterRequest) -> RenderExtent {
    match (&request.size, request.distance) {
        (Some(size), _) if size != SIZE_AUTO => RenderExtent::Size(size.clone()),
        (_, None) => RenderExtent::Size(DEFAULT_SIZE_PRESET.to_string()),
        (_, Some(distance)) => RenderExtent::Distance(distance),
    }
}

/// Build the full invocation for one job.
pub fn build_invocation(request: &PosterRequest, output_path: &Path) -> RenderInvocation {
    RenderInvocation {
        city: request.city.clone(),
        state: request.state.clone(),
        country: request.country.clone(),
        theme: request.theme.clone(),
        output_path: output_path.to_string_lossy().into_owned(),
        extent: resolve_extent(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request() -> PosterRequest {
        PosterRequest::new("Tokyo", "Japan")
    }

    #[test]
    fn test_no_size_no_distance_defaults_to_city_preset() {
        assert_eq!(
            resolve_extent(&request()),
            RenderExtent::Size("city".to_string())
        );
    }

    #[test]
    fn test_auto_size_is_treated_as_unset() {
        let mut req = request();
        req.size = Some("auto".to_string());
        assert_eq!(
            resolve_extent(&req),
            RenderExtent::Size("city".to_string())
        );

        req.distance = Some(5_000);
        assert_eq!(resolve_extent(&req), RenderExtent::Distance(5_000));
    }

    #[test]
    fn test_distance_passed_verbatim_without_size() {
        let mut req = request();
        req.distance = Some(500);
        assert_eq!(resolve_extent(&req), RenderExtent::Distance(500));
    }

    #[test]
    fn test_explicit_size_wins_over_distance() {
        let mut req = request();
        req.size = Some("poster".to_string());
        req.distance = Some(12_000);
        assert_eq!(
            resolve_extent(&req),
            RenderExtent::Size("poster".to_string())
        );
    }

    #[test]
    fn test_invocation_carries_request_fields() {
        let mut req = request();
        req.state = Some("Kanto".to_string());
        let invocation = build_invocation(&req, &PathBuf::from("/data/posters/job-1.png"));
        assert_eq!(invocation.city, "Tokyo");
        assert_eq!(invocation.state.as_deref(), Some("Kanto"));
        assert_eq!(invocation.country, "Japan");
        assert_eq!(invocation.theme, "feature_based");
        assert_eq!(invocation.output_path, "/data/posters/job-1.png");
    }
}
