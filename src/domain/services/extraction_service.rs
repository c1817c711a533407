// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::casino_record::{ExtractedRecord, NO_DATA_MESSAGE};
use crate::domain::models::raw_page::RawPage;
use crate::domain::services::extraction_profile::{
    ExtractionProfile, FieldKind, FieldRule, RowFilter, TableSection,
};
use crate::domain::services::keyword_scan::KeywordScan;
use crate::utils::errors::ExtractionError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|e| ExtractionError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, ExtractionError> {
    Regex::new(pattern).map_err(|source| ExtractionError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// 元素文本，空白折叠为单个空格
pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 将 "500x"、"€1,250.50" 这类文本解析为数字
fn parse_number(text: &str) -> Option<Value> {
    let cleaned = text
        .trim()
        .trim_end_matches(['x', 'X'])
        .trim_start_matches(['€', '$', '£'])
        .replace(',', "");
    let number: f64 = cleaned.trim().parse().ok()?;

    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Some(Value::from(number as i64))
    } else {
        serde_json::Number::from_f64(number).map(Value::Number)
    }
}

struct CompiledFilter {
    date: usize,
    amount: usize,
    player: usize,
    currency: Regex,
    multiplier: Regex,
    min_player_len: usize,
}

impl CompiledFilter {
    fn new(section: &TableSection, filter: &RowFilter) -> Result<Self, ExtractionError> {
        let index_of = |name: &str| {
            section
                .fields
                .iter()
                .position(|f| f.name == name)
                .ok_or_else(|| ExtractionError::UnknownField {
                    section: section.key.clone(),
                    field: name.to_string(),
                })
        };

        Ok(Self {
            date: index_of(&filter.date_field)?,
            amount: index_of(&filter.amount_field)?,
            player: index_of(&filter.player_field)?,
            currency: compile_pattern(&filter.currency_pattern)?,
            multiplier: compile_pattern(&filter.multiplier_pattern)?,
            min_player_len: filter.min_player_len,
        })
    }

    /// 日期非空、金额带货币符号、玩家名足够长且不是纯倍数
    fn accepts(&self, raw: &[Option<String>]) -> bool {
        let value = |i: usize| raw.get(i).and_then(|v| v.as_deref()).unwrap_or("");

        let player = value(self.player);
        !value(self.date).is_empty()
            && self.currency.is_match(value(self.amount))
            && player.chars().count() > self.min_player_len
            && !self.multiplier.is_match(player)
    }
}

struct CompiledSection {
    key: String,
    rows: Selector,
    cell: Selector,
    fields: Vec<FieldRule>,
    limit: Option<usize>,
    filter: Option<CompiledFilter>,
}

impl CompiledSection {
    fn new(section: &TableSection) -> Result<Self, ExtractionError> {
        let filter = section
            .filter
            .as_ref()
            .map(|f| CompiledFilter::new(section, f))
            .transpose()?;

        Ok(Self {
            key: section.key.clone(),
            rows: compile_selector(&section.rows)?,
            cell: compile_selector(&section.cell)?,
            fields: section.fields.clone(),
            limit: section.limit,
            filter,
        })
    }

    fn extract(&self, document: &Html) -> Vec<Map<String, Value>> {
        let mut rows = Vec::new();

        for row in document.select(&self.rows) {
            if self.limit.is_some_and(|limit| rows.len() >= limit) {
                break;
            }

            let cells: Vec<ElementRef<'_>> = row.select(&self.cell).collect();
            let raw: Vec<Option<String>> = self
                .fields
                .iter()
                .map(|field| read_cell(&cells, field))
                .collect();

            if let Some(filter) = &self.filter {
                if !filter.accepts(&raw) {
                    continue;
                }
            }

            let values = self
                .fields
                .iter()
                .zip(raw)
                .map(|(field, raw)| (field.name.clone(), to_value(field, raw)))
                .collect();
            rows.push(values);
        }

        rows
    }
}

fn read_cell(cells: &[ElementRef<'_>], field: &FieldRule) -> Option<String> {
    let cell = cells.get(field.position)?;

    let value = match &field.kind {
        FieldKind::Text | FieldKind::Number => element_text(cell),
        FieldKind::Attribute { name } => cell
            .value()
            .attr(name)
            .map(str::to_string)
            .or_else(|| {
                cell.descendants()
                    .filter_map(ElementRef::wrap)
                    .find_map(|el| el.value().attr(name).map(str::to_string))
            })?
            .trim()
            .to_string(),
    };

    (!value.is_empty()).then_some(value)
}

fn to_value(field: &FieldRule, raw: Option<String>) -> Value {
    match raw {
        None => Value::String(field.fallback.clone()),
        Some(text) => match field.kind {
            FieldKind::Number => parse_number(&text).unwrap_or(Value::String(text)),
            _ => Value::String(text),
        },
    }
}

/// 页面提取器
///
/// 由 [`ExtractionProfile`] 编译而来，选择器和正则只解析一次。
/// 提取是纯函数：同样的页面总是得到同样的记录，失败时也会返回带标记的记录。
pub struct Extractor {
    name: Selector,
    category: String,
    sections: Vec<CompiledSection>,
    keyword_scan: KeywordScan,
}

impl Extractor {
    pub fn new(profile: &ExtractionProfile) -> Result<Self, ExtractionError> {
        Ok(Self {
            name: compile_selector(&profile.name_selector)?,
            category: profile.category.clone(),
            sections: profile
                .sections
                .iter()
                .map(CompiledSection::new)
                .collect::<Result<_, _>>()?,
            keyword_scan: KeywordScan::new(&profile.keyword_scan)?,
        })
    }

    /// 记录类别，抓取失败生成错误记录时也使用它
    pub fn category(&self) -> &str {
        &self.category
    }

    /// 提取记录
    ///
    /// `has_data` 只看结构化区块；关键词扫描只在所有区块为空时执行，且不影响 `has_data`
    pub fn extract(&self, page: &RawPage) -> ExtractedRecord {
        let document = Html::parse_document(&page.html);

        let mut stats = Map::new();
        let mut has_data = false;
        for section in &self.sections {
            let rows = section.extract(&document);
            has_data |= !rows.is_empty();
            stats.insert(
                section.key.clone(),
                Value::Array(rows.into_iter().map(Value::Object).collect()),
            );
        }

        let name = document
            .select(&self.name)
            .map(|el| element_text(&el))
            .find(|text| !text.is_empty())
            .unwrap_or_else(|| page.display_name().to_string());

        let heuristic = (!has_data).then(|| self.keyword_scan.scan(&document, &page.url));
        let features = heuristic
            .as_ref()
            .map(|h| h.features.clone())
            .unwrap_or_else(BTreeSet::new);

        ExtractedRecord {
            name,
            category: self.category.clone(),
            stats,
            features,
            source_url: page.url.clone(),
            has_data,
            no_data_reason: (!has_data).then(|| NO_DATA_MESSAGE.to_string()),
            heuristic,
        }
    }
}
