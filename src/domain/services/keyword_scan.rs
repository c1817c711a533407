// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::casino_record::KeywordScanResult;
use crate::domain::services::extraction_profile::KeywordScanRule;
use crate::domain::services::extraction_service::{compile_pattern, compile_selector, element_text};
use crate::utils::errors::ExtractionError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;

/// 不参与扫描的元素
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// 默认评分
pub const DEFAULT_SCORE: f64 = 0.0;

/// 关键词扫描
///
/// 页面没有结构化表格时的兜底策略：在包含关键词的元素中寻找描述、特性、链接和评分，
/// 找不到的字段使用固定默认值并记录在 `defaulted` 中
pub struct KeywordScan {
    keyword: String,
    any_element: Selector,
    anchor: Selector,
    description_min: usize,
    description_max: usize,
    feature_keywords: Vec<String>,
    score: Regex,
    default_description: String,
    default_features: Vec<String>,
}

impl KeywordScan {
    pub fn new(rule: &KeywordScanRule) -> Result<Self, ExtractionError> {
        Ok(Self {
            keyword: rule.keyword.to_lowercase(),
            any_element: compile_selector("*")?,
            anchor: compile_selector("a[href]")?,
            description_min: rule.description_min,
            description_max: rule.description_max,
            feature_keywords: rule.feature_keywords.clone(),
            score: compile_pattern(&rule.score_pattern)?,
            default_description: rule.default_description.clone(),
            default_features: rule.default_features.clone(),
        })
    }

    pub fn scan(&self, document: &Html, source_url: &str) -> KeywordScanResult {
        let matches: Vec<(ElementRef<'_>, String)> = document
            .select(&self.any_element)
            .filter(|el| !SKIPPED_ELEMENTS.contains(&el.value().name()))
            .filter_map(|el| {
                let text = element_text(&el);
                text.to_lowercase()
                    .contains(&self.keyword)
                    .then_some((el, text))
            })
            .collect();

        let mut defaulted = BTreeSet::new();

        let description = matches
            .iter()
            .map(|(_, text)| text)
            .find(|text| self.is_description(text))
            .cloned()
            .unwrap_or_else(|| {
                defaulted.insert("description".to_string());
                self.default_description.clone()
            });

        let mut features: BTreeSet<String> = self
            .feature_keywords
            .iter()
            .filter(|feature| {
                let needle = feature.to_lowercase();
                matches
                    .iter()
                    .any(|(_, text)| text.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        if features.is_empty() {
            defaulted.insert("features".to_string());
            features = self.default_features.iter().cloned().collect();
        }

        let link = matches
            .iter()
            .find_map(|(el, _)| self.first_href(el))
            .unwrap_or_else(|| {
                defaulted.insert("link".to_string());
                self.fallback_link(source_url)
            });

        let score = matches
            .iter()
            .find_map(|(_, text)| {
                self.score
                    .captures(text)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
            })
            .unwrap_or_else(|| {
                defaulted.insert("score".to_string());
                DEFAULT_SCORE
            });

        KeywordScanResult {
            description,
            features,
            link,
            score,
            defaulted,
        }
    }

    fn is_description(&self, text: &str) -> bool {
        let len = text.chars().count();
        len >= self.description_min
            && len <= self.description_max
            && !text.contains(['{', '}'])
    }

    fn first_href(&self, el: &ElementRef<'_>) -> Option<String> {
        if el.value().name() == "a" {
            if let Some(href) = el.value().attr("href") {
                return Some(href.to_string());
            }
        }
        el.select(&self.anchor)
            .find_map(|a| a.value().attr("href"))
            .map(|href| href.to_string())
    }

    fn fallback_link(&self, source_url: &str) -> String {
        let slug: String = self
            .keyword
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        format!("{}/#{}", source_url.trim_end_matches('/'), slug)
    }
}
