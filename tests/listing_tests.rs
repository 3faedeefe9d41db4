use chrono::{DateTime, Duration, TimeZone, Utc};
use notice_portal::listing::{
    self, AdminNoticeFilter, ListFilter, ListOrder, NewFlag, NoticeListParams,
};
use notice_portal::models::Notice;
use uuid::Uuid;

// --- Fixtures ---

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn at(hours: i64) -> DateTime<Utc> {
    base() + Duration::hours(hours)
}

/// Builds a notice created at `created_h` and expiring at `finish_h`
/// (hours relative to the fixture epoch).
fn notice(title: &str, created_h: i64, finish_h: i64, event: bool, approved: bool) -> Notice {
    Notice {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "d".to_string(),
        image: None,
        link: None,
        priority: None,
        event_start_date: if event { Some(at(created_h)) } else { None },
        finish_on: at(finish_h),
        approved,
        created_on: at(created_h),
    }
}

fn titles(notices: &[Notice]) -> Vec<&str> {
    notices.iter().map(|n| n.title.as_str()).collect()
}

/// A board in the store's base order: newest first.
fn board() -> Vec<Notice> {
    vec![
        notice("c", 3, 10, false, true),
        notice("b", 2, 30, true, true),
        notice("a", 1, 20, false, true),
    ]
}

// --- Ordering ---

#[test]
fn default_order_keeps_newest_first() {
    let arranged = listing::arrange(board(), ListOrder::Newest, ListFilter::All);
    assert_eq!(titles(&arranged), vec!["c", "b", "a"]);
}

#[test]
fn cron_reorders_oldest_first() {
    let arranged = listing::arrange(board(), ListOrder::Oldest, ListFilter::All);
    assert_eq!(titles(&arranged), vec!["a", "b", "c"]);
}

#[test]
fn next_orders_by_soonest_expiry() {
    let arranged = listing::arrange(board(), ListOrder::NextToExpire, ListFilter::All);
    // finish_on hours are c=10, a=20, b=30.
    assert_eq!(titles(&arranged), vec!["c", "a", "b"]);
}

// --- Filtering ---

#[test]
fn notices_filter_drops_events() {
    let arranged = listing::arrange(board(), ListOrder::Newest, ListFilter::NoticesOnly);
    assert_eq!(titles(&arranged), vec!["c", "a"]);
    assert!(arranged.iter().all(|n| !n.is_event()));
}

#[test]
fn events_filter_keeps_only_events() {
    let arranged = listing::arrange(board(), ListOrder::Newest, ListFilter::EventsOnly);
    assert_eq!(titles(&arranged), vec!["b"]);
    assert!(arranged.iter().all(|n| n.is_event()));
}

#[test]
fn filter_preserves_sorted_order() {
    let mut notices = board();
    notices.push(notice("d", 4, 5, false, true));

    // Sort by expiry first, then drop the event; the survivors must keep
    // their post-sort relative order.
    let arranged = listing::arrange(notices, ListOrder::NextToExpire, ListFilter::NoticesOnly);
    assert_eq!(titles(&arranged), vec!["d", "c", "a"]);
}

// --- Parameter fallback ---

#[test]
fn unrecognized_parameters_fall_back_to_defaults() {
    assert_eq!(ListOrder::from_param(Some("bogus")), ListOrder::Newest);
    assert_eq!(ListOrder::from_param(None), ListOrder::Newest);
    assert_eq!(ListFilter::from_param(Some("bogus")), ListFilter::All);
    assert_eq!(ListFilter::from_param(None), ListFilter::All);
    assert_eq!(NewFlag::from_param(Some("bogus")), None);
    assert_eq!(NewFlag::from_param(None), None);
}

#[test]
fn params_struct_maps_known_values() {
    let params = NoticeListParams {
        orderby: Some("cron".to_string()),
        filter: Some("events".to_string()),
        new: Some("requires".to_string()),
    };
    assert_eq!(params.order(), ListOrder::Oldest);
    assert_eq!(params.record_filter(), ListFilter::EventsOnly);
    assert_eq!(params.new_flag(), Some(NewFlag::Pending));

    let params = NoticeListParams {
        orderby: Some("next".to_string()),
        filter: Some("notices".to_string()),
        new: Some("y".to_string()),
    };
    assert_eq!(params.order(), ListOrder::NextToExpire);
    assert_eq!(params.record_filter(), ListFilter::NoticesOnly);
    assert_eq!(params.new_flag(), Some(NewFlag::Published));
}

#[test]
fn new_flag_round_trips_through_its_query_value() {
    for flag in [NewFlag::Published, NewFlag::Pending] {
        assert_eq!(NewFlag::from_param(Some(flag.as_param())), Some(flag));
    }
}

// --- Visibility ---

#[test]
fn visibility_requires_approval_and_future_expiry() {
    let now = base();

    assert!(notice("n", -1, 1, false, true).is_visible(now));
    assert!(!notice("n", -1, 1, false, false).is_visible(now));
    assert!(!notice("n", -2, -1, false, true).is_visible(now));
    // Expiry exactly at `now` is already invisible.
    assert!(!notice("n", -1, 0, false, true).is_visible(now));
}

#[test]
fn board_shows_exactly_the_tomorrow_notice() {
    // finish_on = {yesterday, tomorrow, next week}, approved = {t, t, f}:
    // only the "tomorrow" record survives.
    let now = base();
    let all = vec![
        notice("yesterday", -48, -24, false, true),
        notice("tomorrow", -24, 24, false, true),
        notice("next week", -24, 168, false, false),
    ];

    let visible: Vec<Notice> = all.into_iter().filter(|n| n.is_visible(now)).collect();
    let arranged = listing::arrange(visible, ListOrder::Newest, ListFilter::All);
    assert_eq!(titles(&arranged), vec!["tomorrow"]);
}

// --- Admin filter mapping ---

#[test]
fn admin_filter_params_map_and_fall_back() {
    assert_eq!(
        AdminNoticeFilter::from_param(Some("need_approval")),
        AdminNoticeFilter::NeedApproval
    );
    assert_eq!(
        AdminNoticeFilter::from_param(Some("next")),
        AdminNoticeFilter::Current
    );
    assert_eq!(
        AdminNoticeFilter::from_param(Some("bogus")),
        AdminNoticeFilter::All
    );
    assert_eq!(AdminNoticeFilter::from_param(None), AdminNoticeFilter::All);
}
