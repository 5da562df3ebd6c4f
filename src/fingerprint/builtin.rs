//! Built-in technology table: substring signatures plus runtime probes.
//!
//! Substrings are matched against the page HTML, response headers and URL
//! concatenated together. Runtime probes are JavaScript expressions the
//! capture script evaluates in page context; ids that came back truthy are
//! listed in [`PageCapture::runtime_globals`].

use std::collections::HashSet;

use crate::types::{DetectedTech, DetectionSource, PageCapture};

struct Signature {
    name: &'static str,
    patterns: &'static [&'static str],
}

struct Category {
    name: &'static str,
    technologies: &'static [Signature],
}

const PATTERNS: &[Category] = &[
    Category {
        name: "JavaScript Frameworks",
        technologies: &[
            Signature { name: "React", patterns: &["data-reactroot", "react-dom", "__react"] },
            Signature { name: "Vue.js", patterns: &["data-v-app", "vue.runtime", "__vue__"] },
            Signature { name: "Angular", patterns: &["ng-version=", "ng-app"] },
            Signature { name: "Svelte", patterns: &["svelte-"] },
            Signature { name: "Next.js", patterns: &["__next_data__", "/_next/static"] },
            Signature { name: "Nuxt", patterns: &["__nuxt", "/_nuxt/"] },
            Signature { name: "Gatsby", patterns: &["___gatsby"] },
            Signature { name: "Remix", patterns: &["__remixcontext"] },
            Signature { name: "Astro", patterns: &["astro-island"] },
            Signature { name: "Alpine.js", patterns: &["x-data=", "alpinejs"] },
            Signature { name: "htmx", patterns: &["hx-get=", "hx-post=", "htmx.org"] },
        ],
    },
    Category {
        name: "CMS",
        technologies: &[
            Signature { name: "WordPress", patterns: &["wp-content", "wp-includes"] },
            Signature { name: "Drupal", patterns: &["drupal-settings-json", "/sites/default/files"] },
            Signature { name: "Joomla", patterns: &["/media/jui/", "joomla"] },
            Signature { name: "Ghost", patterns: &["content=\"ghost"] },
            Signature { name: "Webflow", patterns: &["data-wf-page", "webflow.js"] },
            Signature { name: "Wix", patterns: &["static.wixstatic.com", "x-wix-request-id"] },
            Signature { name: "Squarespace", patterns: &["static1.squarespace.com"] },
        ],
    },
    Category {
        name: "Ecommerce",
        technologies: &[
            Signature { name: "Shopify", patterns: &["cdn.shopify.com", "shopify.theme"] },
            Signature { name: "WooCommerce", patterns: &["woocommerce"] },
            Signature { name: "Magento", patterns: &["mage/cookies", "magento"] },
            Signature { name: "BigCommerce", patterns: &["cdn11.bigcommerce.com"] },
        ],
    },
    Category {
        name: "Analytics",
        technologies: &[
            Signature { name: "Google Analytics", patterns: &["google-analytics.com", "gtag/js"] },
            Signature { name: "Google Tag Manager", patterns: &["googletagmanager.com/gtm.js"] },
            Signature { name: "Segment", patterns: &["cdn.segment.com"] },
            Signature { name: "Hotjar", patterns: &["static.hotjar.com"] },
            Signature { name: "Plausible", patterns: &["plausible.io/js"] },
            Signature { name: "Mixpanel", patterns: &["cdn.mxpnl.com"] },
        ],
    },
    Category {
        name: "Hosting",
        technologies: &[
            Signature { name: "Vercel", patterns: &["x-vercel-id", "server: vercel"] },
            Signature { name: "Netlify", patterns: &["x-nf-request-id", "server: netlify"] },
            Signature { name: "Cloudflare", patterns: &["cf-ray", "server: cloudflare"] },
            Signature { name: "Fastly", patterns: &["x-fastly-request-id"] },
            Signature { name: "Amazon CloudFront", patterns: &["x-amz-cf-id"] },
            Signature { name: "GitHub Pages", patterns: &[".github.io", "server: github.com"] },
        ],
    },
    Category {
        name: "UI Libraries",
        technologies: &[
            Signature { name: "Tailwind CSS", patterns: &["tailwindcss", "--tw-"] },
            Signature { name: "Bootstrap", patterns: &["bootstrap.min.css", "bootstrap.bundle"] },
            Signature { name: "jQuery", patterns: &["jquery.min.js", "jquery-"] },
        ],
    },
];

/// A JavaScript expression evaluated in page context by the capture script.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeCheck {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub expression: &'static str,
}

pub const RUNTIME_CHECKS: &[RuntimeCheck] = &[
    RuntimeCheck {
        id: "react",
        name: "React",
        category: "JavaScript Frameworks",
        expression: "!!(window.React || document.querySelector('[data-reactroot]') || (window.__REACT_DEVTOOLS_GLOBAL_HOOK__ && window.__REACT_DEVTOOLS_GLOBAL_HOOK__.renderers && window.__REACT_DEVTOOLS_GLOBAL_HOOK__.renderers.size > 0))",
    },
    RuntimeCheck {
        id: "vue",
        name: "Vue.js",
        category: "JavaScript Frameworks",
        expression: "!!(window.Vue || window.__VUE__ || document.querySelector('[data-v-app]'))",
    },
    RuntimeCheck {
        id: "angular",
        name: "Angular",
        category: "JavaScript Frameworks",
        expression: "!!(window.ng || document.querySelector('[ng-version]'))",
    },
    RuntimeCheck {
        id: "svelte",
        name: "Svelte",
        category: "JavaScript Frameworks",
        expression: "!!document.querySelector('[class*=\"svelte-\"]')",
    },
    RuntimeCheck {
        id: "nextjs",
        name: "Next.js",
        category: "JavaScript Frameworks",
        expression: "!!(window.__NEXT_DATA__ || window.next)",
    },
    RuntimeCheck {
        id: "nuxt",
        name: "Nuxt",
        category: "JavaScript Frameworks",
        expression: "!!(window.__NUXT__ || window.$nuxt)",
    },
    RuntimeCheck {
        id: "gatsby",
        name: "Gatsby",
        category: "JavaScript Frameworks",
        expression: "!!document.getElementById('___gatsby')",
    },
    RuntimeCheck {
        id: "jquery",
        name: "jQuery",
        category: "UI Libraries",
        expression: "!!(window.jQuery && window.jQuery.fn && window.jQuery.fn.jquery)",
    },
    RuntimeCheck {
        id: "alpine",
        name: "Alpine.js",
        category: "JavaScript Frameworks",
        expression: "!!window.Alpine",
    },
];

fn haystack(page: &PageCapture) -> String {
    let mut text = String::with_capacity(page.html.len() + 256);
    text.push_str(&page.html);
    text.push('\n');
    for (name, value) in &page.headers {
        text.push_str(name);
        text.push_str(": ");
        text.push_str(value);
        text.push('\n');
    }
    text.push_str(&page.url);
    text.to_ascii_lowercase()
}

/// Runtime detections first (higher precision), then pattern hits not
/// already reported in the same category.
pub fn detect(page: &PageCapture) -> Vec<DetectedTech> {
    let mut out = Vec::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();

    for check in RUNTIME_CHECKS {
        if page.runtime_globals.iter().any(|id| id == check.id)
            && seen.insert((check.category, check.name))
        {
            out.push(DetectedTech {
                category: check.category.to_string(),
                name: check.name.to_string(),
                source: DetectionSource::Runtime,
            });
        }
    }

    let text = haystack(page);
    for category in PATTERNS {
        for tech in category.technologies {
            if tech.patterns.iter().any(|p| text.contains(p))
                && seen.insert((category.name, tech.name))
            {
                out.push(DetectedTech {
                    category: category.name.to_string(),
                    name: tech.name.to_string(),
                    source: DetectionSource::Pattern,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn patterns_cover_html_headers_and_url() {
        let page = PageCapture {
            url: "https://someone.github.io/docs".into(),
            html: r#"<link rel="stylesheet" href="/wp-content/themes/a/style.css">"#.into(),
            headers: BTreeMap::from([("cf-ray".to_string(), "8a1b2c3d-AMS".to_string())]),
            ..Default::default()
        };
        let names: Vec<String> = detect(&page).into_iter().map(|d| d.name).collect();
        assert!(names.contains(&"WordPress".to_string()));
        assert!(names.contains(&"Cloudflare".to_string()));
        assert!(names.contains(&"GitHub Pages".to_string()));
    }

    #[test]
    fn runtime_detection_wins_and_dedups() {
        let page = PageCapture {
            html: r#"<div id="__next"></div><script id="__NEXT_DATA__">{}</script>"#.into(),
            runtime_globals: vec!["nextjs".into(), "unknown-probe".into()],
            ..Default::default()
        };
        let found = detect(&page);
        let next: Vec<&DetectedTech> = found.iter().filter(|d| d.name == "Next.js").collect();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].source, DetectionSource::Runtime);
    }

    #[test]
    fn runtime_ids_are_unique() {
        let mut ids = HashSet::new();
        for check in RUNTIME_CHECKS {
            assert!(ids.insert(check.id), "duplicate id {}", check.id);
        }
    }
}
