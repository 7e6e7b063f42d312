use crate::config::{AssetConfig, SiteConfig};
use std::path::PathBuf;

/// One supported locale of the exported application.
///
/// The default locale has no URL path segment and no filename prefix; every
/// other locale contributes `<code>/` to its page URLs and `<code>_` to its
/// exported filenames.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    pub code: String,
    pub is_default: bool,
}

impl Locale {
    pub fn new<S: Into<String>>(code: S, is_default: bool) -> Self {
        Self {
            code: code.into(),
            is_default,
        }
    }

    /// URL path segment for this locale, e.g. `fr/` (empty for the default).
    pub fn url_path(&self) -> String {
        if self.is_default {
            String::new()
        } else {
            format!("{}/", self.code)
        }
    }

    /// Filename prefix for pages in this locale, e.g. `fr_` (empty for the default).
    pub fn file_prefix(&self) -> String {
        if self.is_default {
            String::new()
        } else {
            format!("{}_", self.code)
        }
    }

    /// Human-readable name used in the generated index page.
    pub fn display_name(&self) -> &str {
        if self.is_default {
            "default"
        } else {
            &self.code
        }
    }
}

/// Paths of the bundled CSS/JS assets produced by an external bundler.
///
/// Both fields are optional: bundling may be disabled entirely, or only one
/// asset type may be produced.
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    pub css: Option<PathBuf>,
    pub js: Option<PathBuf>,
}

impl AssetBundle {
    pub fn is_empty(&self) -> bool {
        self.css.is_none() && self.js.is_none()
    }
}

/// External bundler collaborator. The export pipeline never triggers bundling
/// itself; it only consumes whatever the bundler has already produced.
pub trait AssetBundler {
    fn cached_asset_paths(&self) -> AssetBundle;
}

/// External application/router collaborator: the list of locales and
/// controllers to snapshot, and the locally-served URL for each combination.
pub trait AppRouter {
    /// Ordered locales; the first entry is the default locale.
    fn locales(&self) -> Vec<Locale>;

    /// Controller slugs, one page per locale each.
    fn controllers(&self) -> Vec<String>;

    /// The application's own default/index controller slug.
    fn index_controller(&self) -> &str;

    /// Host header to send with every snapshot request.
    fn host_header(&self) -> &str;

    /// Endpoint serving the rendered page for a locale/controller pair.
    fn endpoint_url(&self, locale: &Locale, controller: &str) -> String;
}

/// Config-backed bundler: asset paths come straight from the `[assets]`
/// section of the configuration file.
pub struct ConfigBundler {
    bundle: AssetBundle,
}

impl ConfigBundler {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            bundle: AssetBundle {
                css: config.css_bundle.clone(),
                js: config.js_bundle.clone(),
            },
        }
    }
}

impl AssetBundler for ConfigBundler {
    fn cached_asset_paths(&self) -> AssetBundle {
        self.bundle.clone()
    }
}

/// Config-backed router over the `[site]` section.
pub struct ConfigRouter {
    base_url: String,
    host: String,
    locales: Vec<Locale>,
    controllers: Vec<String>,
    index_controller: String,
}

impl ConfigRouter {
    pub fn new(config: &SiteConfig) -> Self {
        let locales = config
            .locales
            .iter()
            .enumerate()
            .map(|(i, code)| Locale::new(code.clone(), i == 0))
            .collect();

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            host: config.host.clone(),
            locales,
            controllers: config.controllers.clone(),
            index_controller: config.index_controller.clone(),
        }
    }
}

impl AppRouter for ConfigRouter {
    fn locales(&self) -> Vec<Locale> {
        self.locales.clone()
    }

    fn controllers(&self) -> Vec<String> {
        self.controllers.clone()
    }

    fn index_controller(&self) -> &str {
        &self.index_controller
    }

    fn host_header(&self) -> &str {
        &self.host
    }

    fn endpoint_url(&self, locale: &Locale, controller: &str) -> String {
        format!(
            "{}/{}{}",
            self.base_url,
            locale.url_path(),
            controller.to_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn test_site_config() -> SiteConfig {
        SiteConfig {
            host: "example.com".to_string(),
            base_url: "http://127.0.0.1:8080/".to_string(),
            locales: vec!["default".to_string(), "fr".to_string()],
            controllers: vec!["Home".to_string(), "about".to_string()],
            index_controller: "home".to_string(),
        }
    }

    #[test]
    fn test_default_locale_has_no_prefix() {
        let locale = Locale::new("en", true);
        assert_eq!(locale.url_path(), "");
        assert_eq!(locale.file_prefix(), "");
        assert_eq!(locale.display_name(), "default");
    }

    #[test]
    fn test_non_default_locale_prefixes() {
        let locale = Locale::new("fr", false);
        assert_eq!(locale.url_path(), "fr/");
        assert_eq!(locale.file_prefix(), "fr_");
        assert_eq!(locale.display_name(), "fr");
    }

    #[test]
    fn test_config_router_endpoints() {
        let router = ConfigRouter::new(&test_site_config());
        let locales = router.locales();

        assert!(locales[0].is_default);
        assert!(!locales[1].is_default);

        // Controller slugs are lowercased in URLs and the trailing base slash
        // is normalized away.
        assert_eq!(
            router.endpoint_url(&locales[0], "Home"),
            "http://127.0.0.1:8080/home"
        );
        assert_eq!(
            router.endpoint_url(&locales[1], "about"),
            "http://127.0.0.1:8080/fr/about"
        );
    }

    #[test]
    fn test_empty_asset_bundle() {
        let bundle = AssetBundle::default();
        assert!(bundle.is_empty());

        let bundle = AssetBundle {
            css: Some(PathBuf::from("cache/style.css")),
            js: None,
        };
        assert!(!bundle.is_empty());
    }
}
