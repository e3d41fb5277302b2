//! Authenticated client session for a Wekan server.
//!
//! # Design
//! `WekanClient` logs in once at construction and keeps the token for its
//! whole lifetime. Every operation is one blocking round trip through the
//! `Transport`, except the composite ones (`cards`, `get_all_card_data`,
//! `add_card`) which resolve titles to identifiers first and then act.
//!
//! A title that matches nothing is handled according to `MissPolicy`:
//! `Strict` fails before any further request, `Permissive` carries on with
//! an empty identifier.

use std::iter::FusedIterator;
use std::vec;

use tracing::{debug, info, warn};

use crate::client::WekanApi;
use crate::config::{ClientConfig, MissPolicy};
use crate::error::ApiError;
use crate::http::ApiResponse;
use crate::resolve;
use crate::transport::{Transport, UreqTransport};
use crate::types::{BoardSummary, Card, CardSummary, CreatedCard, FormData, ListSummary, Session};

/// Blocking Wekan API client bound to one authenticated session.
///
/// Not meant to be shared between threads; use one client per worker.
#[derive(Debug)]
pub struct WekanClient<T = UreqTransport> {
    api: WekanApi,
    transport: T,
    session: Session,
    miss_policy: MissPolicy,
}

impl WekanClient<UreqTransport> {
    /// Open a `ureq` session and log in.
    pub fn connect(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = UreqTransport::with_proxy(config.proxy.as_deref())?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> WekanClient<T> {
    /// Log in over `transport` and keep the issued token.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        let api = WekanApi::new(&config.base_url);
        let request = api.build_login(&config.username, &config.password);
        let session = api.parse_login(transport.execute(request)?)?;
        info!(user_id = %session.user_id, base_url = api.base_url(), "logged in to wekan");
        Ok(Self {
            api,
            transport,
            session,
            miss_policy: config.miss_policy,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user_id(&self) -> &str {
        &self.session.user_id
    }

    /// Call `path` directly.
    ///
    /// A GET (no `data`) always carries the bearer token. A POST carries it
    /// only when `authed` is set. The reply is parsed as JSON whatever its
    /// status; non-2xx replies come back as `ApiResponse::Failure`.
    pub fn api_call(
        &self,
        path: &str,
        data: Option<&FormData>,
        authed: bool,
    ) -> Result<ApiResponse, ApiError> {
        let token = (authed || data.is_none()).then_some(self.session.token.as_str());
        let request = self.api.build_call(path, data, token);
        self.api.parse_response(self.transport.execute(request)?)
    }

    pub fn get_boards(&self) -> Result<Vec<BoardSummary>, ApiError> {
        let request = self
            .api
            .build_list_boards(&self.session.token, &self.session.user_id);
        self.api.parse_boards(self.transport.execute(request)?)
    }

    pub fn get_lists(&self, board_id: &str) -> Result<Vec<ListSummary>, ApiError> {
        let request = self.api.build_list_lists(&self.session.token, board_id);
        self.api.parse_lists(self.transport.execute(request)?)
    }

    pub fn get_cards(&self, board_id: &str, list_id: &str) -> Result<Vec<CardSummary>, ApiError> {
        let request = self
            .api
            .build_list_cards(&self.session.token, board_id, list_id);
        self.api.parse_cards(self.transport.execute(request)?)
    }

    pub fn get_card_data(
        &self,
        board_id: &str,
        list_id: &str,
        card_id: &str,
    ) -> Result<Card, ApiError> {
        let request = self
            .api
            .build_get_card(&self.session.token, board_id, list_id, card_id);
        self.api.parse_card(self.transport.execute(request)?)
    }

    /// Identifier of the first board titled `title`, fetched fresh.
    pub fn get_board_id(&self, title: &str) -> Result<Option<String>, ApiError> {
        let boards = self.get_boards()?;
        Ok(resolve::find_board_id(&boards, title).map(str::to_string))
    }

    pub fn get_list_id<'a>(&self, lists: &'a [ListSummary], title: &str) -> Option<&'a str> {
        resolve::find_list_id(lists, title)
    }

    pub fn get_list_title<'a>(&self, lists: &'a [ListSummary], list_id: &str) -> Option<&'a str> {
        resolve::find_list_title(lists, list_id)
    }

    /// Lazily walk every card of the board titled `board_title`.
    ///
    /// Lists are fetched up front; each step of the iterator then issues at
    /// most two requests (the next list's card rows, the next card). The
    /// stream ends after yielding its first error.
    pub fn cards(&self, board_title: &str) -> Result<CardStream<'_, T>, ApiError> {
        let board_id = self.resolve_board(board_title)?;
        let lists = self.lists_for(&board_id)?;
        debug!(%board_id, lists = lists.len(), "walking board cards");
        Ok(CardStream {
            client: self,
            board_id,
            lists: lists.into_iter(),
            current: None,
            done: false,
        })
    }

    /// Every card of the board titled `board_title`, in list-then-card
    /// order. Any failed request aborts the whole fetch.
    pub fn get_all_card_data(&self, board_title: &str) -> Result<Vec<Card>, ApiError> {
        self.cards(board_title)?.collect()
    }

    /// Create a card from `card_data` on the list `list_title` of the board
    /// `board_title`.
    ///
    /// Under `MissPolicy::Strict` a rejected create fails with
    /// `ApiError::Status`, so success is always `Some`. Under `Permissive`
    /// the create reply is not judged: a non-2xx reply (typically to an
    /// empty-segment path) is logged and discarded, yielding `None`.
    pub fn add_card(
        &self,
        board_title: &str,
        list_title: &str,
        card_data: &FormData,
    ) -> Result<Option<CreatedCard>, ApiError> {
        let board_id = self.resolve_board(board_title)?;
        let lists = self.lists_for(&board_id)?;
        let list_id = self.resolve_list(&lists, list_title)?;
        let request = self
            .api
            .build_create_card(&self.session.token, &board_id, &list_id, card_data);
        let response = self.transport.execute(request)?;

        let created = match self.miss_policy {
            MissPolicy::Strict => Some(self.api.parse_created_card(response)?),
            MissPolicy::Permissive => match self.api.parse_response(response)? {
                ApiResponse::Success { body, .. } => serde_json::from_value::<CreatedCard>(body).ok(),
                ApiResponse::Failure { status, body } => {
                    warn!(status, %body, %board_id, %list_id, "card create rejected");
                    None
                }
            },
        };
        if let Some(created) = &created {
            debug!(card_id = %created.id, %board_id, %list_id, "card created");
        }
        Ok(created)
    }

    /// Lists of `board_id`. Under `Permissive` an unresolved (empty) board
    /// has no lists; the server rejecting `/api/boards//lists` is not an
    /// error.
    fn lists_for(&self, board_id: &str) -> Result<Vec<ListSummary>, ApiError> {
        match self.get_lists(board_id) {
            Err(ApiError::Status { status, .. })
                if board_id.is_empty() && self.miss_policy == MissPolicy::Permissive =>
            {
                debug!(status, "no lists for unresolved board");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn resolve_board(&self, title: &str) -> Result<String, ApiError> {
        match self.get_board_id(title)? {
            Some(id) => Ok(id),
            None => {
                warn!(board = title, policy = ?self.miss_policy, "no board with this title");
                match self.miss_policy {
                    MissPolicy::Strict => Err(ApiError::BoardNotFound(title.to_string())),
                    MissPolicy::Permissive => Ok(String::new()),
                }
            }
        }
    }

    fn resolve_list(&self, lists: &[ListSummary], title: &str) -> Result<String, ApiError> {
        match resolve::find_list_id(lists, title) {
            Some(id) => Ok(id.to_string()),
            None => {
                warn!(list = title, policy = ?self.miss_policy, "no list with this title");
                match self.miss_policy {
                    MissPolicy::Strict => Err(ApiError::ListNotFound(title.to_string())),
                    MissPolicy::Permissive => Ok(String::new()),
                }
            }
        }
    }
}

/// Iterator over full card records, produced by `WekanClient::cards`.
pub struct CardStream<'a, T> {
    client: &'a WekanClient<T>,
    board_id: String,
    lists: vec::IntoIter<ListSummary>,
    current: Option<(String, vec::IntoIter<CardSummary>)>,
    done: bool,
}

impl<T: Transport> Iterator for CardStream<'_, T> {
    type Item = Result<Card, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some((list_id, cards)) = self.current.as_mut() {
                if let Some(card) = cards.next() {
                    let result = self.client.get_card_data(&self.board_id, list_id.as_str(), &card.id);
                    self.done = result.is_err();
                    return Some(result);
                }
            }
            self.current = None;

            let list = self.lists.next()?;
            match self.client.get_cards(&self.board_id, &list.id) {
                Ok(cards) => self.current = Some((list.id, cards.into_iter())),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<T: Transport> FusedIterator for CardStream<'_, T> {}
