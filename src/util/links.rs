use url::Url;

/// Resolves `reference` against `base` the way a browser resolves an `href`.
///
/// Absolute references are returned unchanged; relative ones (`/img/x.jpg`,
/// `img/x.jpg`, `//cdn/x.jpg`) take whatever they lack from `base`.
pub fn resolve_against(base: &Url, reference: &str) -> Result<Url, url::ParseError> {
    base.join(reference)
}
