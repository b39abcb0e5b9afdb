use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use vnn_core::{RawEvent, StateCode};

use super::HtmlSourceConfig;
use crate::dates::extract_start;
use crate::error::{SourceError, SourceResult};
use crate::location::resolve_place;

const TIME_SELECTOR: &str = "time";
const LINK_SELECTOR: &str = "a[href]";

pub(super) fn compile(selector: &str) -> SourceResult<Selector> {
    Selector::parse(selector).map_err(|e| {
        SourceError::configuration(format!("invalid CSS selector {:?}: {:?}", selector, e))
    })
}

/// Extracts event candidates from a listing page.
///
/// Cards without a title or without a recognizable date are skipped. A
/// card without a link points at the page itself.
pub fn parse_html_events(
    html: &str,
    page_url: &Url,
    config: &HtmlSourceConfig,
    regions: &[StateCode],
) -> SourceResult<Vec<RawEvent>> {
    let document = Html::parse_document(html);
    let title = compile(&config.title_selector)?;
    let time = compile(TIME_SELECTOR)?;
    let link = compile(LINK_SELECTOR)?;
    let location = config
        .location_selector
        .as_deref()
        .map(compile)
        .transpose()?;

    let mut cards: Vec<ElementRef<'_>> = if config.card_selectors.is_empty() {
        Vec::new()
    } else {
        document
            .select(&compile(&config.card_selectors.join(", "))?)
            .collect()
    };
    if cards.is_empty() && !config.fallback_selectors.is_empty() {
        cards = document
            .select(&compile(&config.fallback_selectors.join(", "))?)
            .collect();
    }

    let mut events = Vec::new();
    for card in cards {
        let Some(title_text) = card_title(card, &title) else {
            continue;
        };

        let when = card
            .select(&time)
            .next()
            .map(|t| {
                t.value()
                    .attr("datetime")
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(t))
            })
            .or_else(|| config.scan_card_text.then(|| element_text(card)));
        let Some(start) = when.as_deref().and_then(extract_start) else {
            debug!(source = %config.name, title = %title_text, "Card has no usable date");
            continue;
        };

        let mut event = RawEvent::new(&config.name)
            .with_title(title_text)
            .with_start(start);
        if let Some(ref tz) = config.timezone {
            event = event.with_timezone(tz);
        }
        let url = card_link(card, &link, page_url).unwrap_or_else(|| page_url.to_string());
        event = event.with_registration_url(url);

        let place = location
            .as_ref()
            .and_then(|sel| card.select(sel).next())
            .map(element_text)
            .filter(|text| !text.is_empty());
        let resolved = place.as_deref().and_then(|text| resolve_place(text, regions));
        match resolved {
            Some(found) => {
                if let Some(city) = found.city.or_else(|| config.default_city.clone()) {
                    event = event.with_city(city);
                }
                event = event.with_state(found.state.as_str());
            }
            None => {
                if let Some(ref city) = config.default_city {
                    event = event.with_city(city);
                }
                if let Some(state) = config.default_state {
                    event = event.with_state(state.as_str());
                }
            }
        }
        if let Some(text) = place {
            event = event.with_address(text);
        }

        events.push(event);
    }

    Ok(events)
}

fn card_title(card: ElementRef<'_>, title: &Selector) -> Option<String> {
    let text = match card.select(title).next() {
        Some(el) => element_text(el),
        // A bare link card is its own title.
        None if card.value().name() == "a" => element_text(card),
        None => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn card_link(card: ElementRef<'_>, link: &Selector, page_url: &Url) -> Option<String> {
    let href = card
        .select(link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .or_else(|| card.value().attr("href"))?
        .trim();
    if href.is_empty() {
        return None;
    }
    page_url.join(href).ok().map(String::from)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
