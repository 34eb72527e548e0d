//! Field dictionary: Chinese report labels <-> internal field ids.
//!
//! The table order is the match order used by the parser when scanning a
//! line, so it must stay stable.

/// The 13 numeric categories a daily report can carry (the date is separate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    Meituan,
    StoredCardRedemption,
    Douyin,
    CoachingRedemption,
    Wechat,
    Alipay,
    Water,
    Gatorade,
    Other,
    TrialClass,
    StoredCardRecharge,
    PrivateCoachingRecharge,
    MonthlyCard,
}

/// Ordered (label, field) pairs. A line is matched against these in order
/// and the first label found wins.
pub const FIELD_TABLE: [(&str, FieldId); 13] = [
    ("大众美团", FieldId::Meituan),
    ("储值卡核销", FieldId::StoredCardRedemption),
    ("抖音", FieldId::Douyin),
    ("教练课核销", FieldId::CoachingRedemption),
    ("微信", FieldId::Wechat),
    ("支付宝", FieldId::Alipay),
    ("水", FieldId::Water),
    ("佳得乐", FieldId::Gatorade),
    ("其他", FieldId::Other),
    ("体验课", FieldId::TrialClass),
    ("储值卡充值", FieldId::StoredCardRecharge),
    ("私教课充值", FieldId::PrivateCoachingRecharge),
    ("月卡", FieldId::MonthlyCard),
];

impl FieldId {
    /// All fields in table order.
    pub const ALL: [FieldId; 13] = [
        FieldId::Meituan,
        FieldId::StoredCardRedemption,
        FieldId::Douyin,
        FieldId::CoachingRedemption,
        FieldId::Wechat,
        FieldId::Alipay,
        FieldId::Water,
        FieldId::Gatorade,
        FieldId::Other,
        FieldId::TrialClass,
        FieldId::StoredCardRecharge,
        FieldId::PrivateCoachingRecharge,
        FieldId::MonthlyCard,
    ];
}

/// Look up a field id by its Chinese label. Unknown labels are simply no
/// match (the parser skips such lines), not an error.
pub fn label_to_field(label: &str) -> Option<FieldId> {
    FIELD_TABLE
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, f)| *f)
}

/// The Chinese label for a field id, used in validation messages and the
/// operator-facing summary.
pub fn field_to_label(field: FieldId) -> &'static str {
    match field {
        FieldId::Meituan => "大众美团",
        FieldId::StoredCardRedemption => "储值卡核销",
        FieldId::Douyin => "抖音",
        FieldId::CoachingRedemption => "教练课核销",
        FieldId::Wechat => "微信",
        FieldId::Alipay => "支付宝",
        FieldId::Water => "水",
        FieldId::Gatorade => "佳得乐",
        FieldId::Other => "其他",
        FieldId::TrialClass => "体验课",
        FieldId::StoredCardRecharge => "储值卡充值",
        FieldId::PrivateCoachingRecharge => "私教课充值",
        FieldId::MonthlyCard => "月卡",
    }
}
