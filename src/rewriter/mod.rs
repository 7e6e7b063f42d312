pub mod links;

pub use links::{
    rewrite_bundled_css_link, rewrite_bundled_js_link, rewrite_css_urls, rewrite_image_srcs,
    rewrite_page, strip_base_href,
};
