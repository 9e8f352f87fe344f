//! 通用页面选择器
//!
//! 预编译的 CSS 选择器

use std::sync::OnceLock;

use scraper::Selector;

/// 与站点无关的固定选择器集合
pub struct PageSelectors {
    pub og_image: Selector,
    pub heading: Selector,
    pub list: Selector,
}

static SELECTORS: OnceLock<PageSelectors> = OnceLock::new();

impl PageSelectors {
    /// 获取全局选择器实例
    pub fn get() -> &'static PageSelectors {
        SELECTORS.get_or_init(|| PageSelectors {
            og_image: Selector::parse(r#"meta[property="og:image"]"#).unwrap(),
            heading: Selector::parse("h1").unwrap(),
            list: Selector::parse("ul").unwrap(),
        })
    }
}
