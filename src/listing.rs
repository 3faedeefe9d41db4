use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::Notice;

/// ListOrder
///
/// Ordering selected by the index `orderby` parameter. The store hands the
/// base set over newest-first; `Oldest` is a distinct re-sort in the opposite
/// direction, not a skipped one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Descending `created_on`. The default.
    Newest,
    /// `orderby=cron`: ascending `created_on`.
    Oldest,
    /// `orderby=next`: ascending `finish_on`, soonest to expire first.
    NextToExpire,
}

impl ListOrder {
    /// Unrecognized values behave exactly like an absent parameter.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("cron") => ListOrder::Oldest,
            Some("next") => ListOrder::NextToExpire,
            _ => ListOrder::Newest,
        }
    }
}

/// ListFilter
///
/// Record filter selected by the index `filter` parameter. Applied after
/// sorting, so it never changes the relative order of retained records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    All,
    /// `filter=notices`: drop records carrying an event start date.
    NoticesOnly,
    /// `filter=events`: keep only records carrying an event start date.
    EventsOnly,
}

impl ListFilter {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("notices") => ListFilter::NoticesOnly,
            Some("events") => ListFilter::EventsOnly,
            _ => ListFilter::All,
        }
    }
}

/// NewFlag
///
/// Post-redirect marker set by the submission handler, used only to select
/// the index flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewFlag {
    /// `new=y`: the notice went straight to the board.
    Published,
    /// `new=requires`: the notice waits for an administrator.
    Pending,
}

impl NewFlag {
    pub fn from_param(value: Option<&str>) -> Option<Self> {
        match value {
            Some("y") => Some(NewFlag::Published),
            Some("requires") => Some(NewFlag::Pending),
            _ => None,
        }
    }

    /// Query-string value used when building the redirect.
    pub fn as_param(self) -> &'static str {
        match self {
            NewFlag::Published => "y",
            NewFlag::Pending => "requires",
        }
    }
}

/// NoticeListParams
///
/// The index request's query parameters, bound as plain optional strings so
/// that unknown values degrade to the defaults instead of rejecting the
/// request.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct NoticeListParams {
    /// `cron` (oldest first) or `next` (soonest to expire first).
    pub orderby: Option<String>,
    /// `notices` or `events`.
    pub filter: Option<String>,
    /// `y` or `requires`, set by the submission redirect.
    pub new: Option<String>,
}

impl NoticeListParams {
    pub fn order(&self) -> ListOrder {
        ListOrder::from_param(self.orderby.as_deref())
    }

    pub fn record_filter(&self) -> ListFilter {
        ListFilter::from_param(self.filter.as_deref())
    }

    pub fn new_flag(&self) -> Option<NewFlag> {
        NewFlag::from_param(self.new.as_deref())
    }
}

/// Orders and filters the visible board.
///
/// `notices` must arrive newest-first (the store's base order). Sorting runs
/// first and filtering second; both sorts are stable, so ties and retained
/// records keep their incoming relative order.
pub fn arrange(mut notices: Vec<Notice>, order: ListOrder, filter: ListFilter) -> Vec<Notice> {
    match order {
        ListOrder::Newest => {}
        ListOrder::Oldest => notices.sort_by_key(|n| n.created_on),
        ListOrder::NextToExpire => notices.sort_by_key(|n| n.finish_on),
    }

    match filter {
        ListFilter::All => {}
        ListFilter::NoticesOnly => notices.retain(|n| !n.is_event()),
        ListFilter::EventsOnly => notices.retain(|n| n.is_event()),
    }

    notices
}

/// AdminNoticeFilter
///
/// Row-set predicate for the admin notice grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminNoticeFilter {
    /// `filter=need_approval`: unapproved records still within their dates.
    NeedApproval,
    /// `filter=next`: every record still within its dates, approved or not.
    Current,
    /// Default: the whole table.
    All,
}

impl AdminNoticeFilter {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("need_approval") => AdminNoticeFilter::NeedApproval,
            Some("next") => AdminNoticeFilter::Current,
            _ => AdminNoticeFilter::All,
        }
    }
}

/// AdminNoticeParams
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminNoticeParams {
    /// `need_approval` or `next`.
    pub filter: Option<String>,
}

impl AdminNoticeParams {
    pub fn row_filter(&self) -> AdminNoticeFilter {
        AdminNoticeFilter::from_param(self.filter.as_deref())
    }
}
