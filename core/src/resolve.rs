//! Title and identifier lookups over fetched collections.
//!
//! Every lookup is a linear scan returning the first exact, case-sensitive
//! match.

use crate::types::{BoardSummary, ListSummary};

pub fn find_board_id<'a>(boards: &'a [BoardSummary], title: &str) -> Option<&'a str> {
    boards
        .iter()
        .find(|board| board.title == title)
        .map(|board| board.id.as_str())
}

pub fn find_list_id<'a>(lists: &'a [ListSummary], title: &str) -> Option<&'a str> {
    lists
        .iter()
        .find(|list| list.title == title)
        .map(|list| list.id.as_str())
}

pub fn find_list_title<'a>(lists: &'a [ListSummary], id: &str) -> Option<&'a str> {
    lists
        .iter()
        .find(|list| list.id == id)
        .map(|list| list.title.as_str())
}
