//! Fill in category, expiry date and value when recognition left them empty

use chrono::{Local, Months, NaiveDate};
use rand::Rng;

use super::types::RecognitionCandidate;
use crate::config::ClientOptions;

/// Language of the category labels written into candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelSet {
    #[default]
    Chinese,
    English,
}

/// How a missing value is filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValuePolicy {
    /// Leave the value empty
    #[default]
    Unset,
    /// Record a value of zero
    Zero,
    /// Pick a random amount from the category's price band
    RandomBand,
}

/// The fixed set of inferred categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    FoodBeverage,
    Medicine,
    Clothing,
    Electronics,
    Books,
    Tools,
    CleaningSupplies,
    Decor,
    Other,
}

/// Keyword table; the first matching row wins.
///
/// Latin keywords only match whole words (a trailing plural `s`/`es` is
/// allowed); Chinese keywords match anywhere.
const RULES: &[(CategoryKind, &[&str])] = &[
    (
        CategoryKind::FoodBeverage,
        &[
            "牛奶", "酸奶", "奶粉", "食品", "饮料", "零食", "水果", "蔬菜", "苹果", "香蕉", "橙", "面包",
            "饼干", "薯片", "巧克力", "糖果", "大米", "面条", "方便面", "食用油", "酱油", "醋", "调料",
            "茶叶", "咖啡", "果汁", "可乐", "啤酒", "矿泉水", "罐头", "鸡蛋", "肉", "milk", "yogurt",
            "food", "snack", "fruit", "vegetable", "apple", "banana", "bread", "cookie", "chips",
            "chocolate", "candy", "rice", "noodle", "cereal", "sauce", "coffee", "juice", "soda", "beer",
            "wine", "water bottle", "egg",
        ],
    ),
    (
        CategoryKind::Medicine,
        &[
            "药", "胶囊", "维生素", "感冒", "退烧", "止痛", "创可贴", "体温计", "口罩", "钙片", "medicine",
            "pill", "capsule", "vitamin", "aspirin", "ibuprofen", "paracetamol", "bandage", "thermometer",
            "syrup",
        ],
    ),
    (
        CategoryKind::Clothing,
        &[
            "衣服", "上衣", "外套", "大衣", "毛衣", "衬衫", "t恤", "内衣", "裤", "裙", "鞋", "袜", "帽",
            "围巾", "手套", "shirt", "t-shirt", "pants", "jeans", "dress", "skirt", "shoe", "sneaker",
            "sock", "hat", "jacket", "coat", "sweater", "hoodie", "scarf", "glove",
        ],
    ),
    (
        CategoryKind::Electronics,
        &[
            "手机", "电脑", "笔记本电脑", "平板", "耳机", "充电器", "充电宝", "数据线", "相机", "电视",
            "音箱", "键盘", "鼠标", "路由器", "显示器", "电池", "phone", "laptop", "macbook", "computer",
            "tablet", "ipad", "headphone", "earbuds", "charger", "power bank", "cable", "camera",
            "television", "smartphone", "iphone", "socket", "batteries", "speaker", "keyboard", "mouse", "router", "monitor", "battery",
        ],
    ),
    (
        CategoryKind::Books,
        &[
            "书", "杂志", "笔记本", "词典", "字典", "小说", "漫画", "教材", "book", "magazine", "notebook",
            "dictionary", "novel", "comic", "textbook",
        ],
    ),
    (
        CategoryKind::Tools,
        &[
            "工具", "螺丝刀", "扳手", "锤子", "钳子", "电钻", "卷尺", "胶带", "剪刀", "螺丝", "tool",
            "screwdriver", "wrench", "hammer", "pliers", "drill", "tape measure", "scissors", "screw",
        ],
    ),
    (
        CategoryKind::CleaningSupplies,
        &[
            "清洁", "洗衣液", "洗衣粉", "洗洁精", "消毒液", "纸巾", "抹布", "拖把", "扫帚", "垃圾袋",
            "洗发水", "沐浴露", "牙膏", "香皂", "detergent", "soap", "cleaner", "sponge", "mop", "broom",
            "tissue", "bleach", "shampoo", "toothpaste", "trash bag",
        ],
    ),
    (
        CategoryKind::Decor,
        &[
            "装饰", "摆件", "抱枕", "花瓶", "相框", "挂画", "蜡烛", "绿植", "地毯", "decor", "vase", "photo frame",
            "candle", "painting", "poster", "rug", "ornament", "plant", "pillow", "cushion",
        ],
    ),
];

impl CategoryKind {
    /// Display label in the requested language
    pub fn label(&self, labels: LabelSet) -> &'static str {
        match labels {
            LabelSet::Chinese => match self {
                CategoryKind::FoodBeverage => "食品饮料",
                CategoryKind::Medicine => "药品",
                CategoryKind::Clothing => "服装",
                CategoryKind::Electronics => "电子产品",
                CategoryKind::Books => "书籍",
                CategoryKind::Tools => "工具",
                CategoryKind::CleaningSupplies => "清洁用品",
                CategoryKind::Decor => "装饰品",
                CategoryKind::Other => "其他",
            },
            LabelSet::English => match self {
                CategoryKind::FoodBeverage => "Food & Beverage",
                CategoryKind::Medicine => "Medicine",
                CategoryKind::Clothing => "Clothing",
                CategoryKind::Electronics => "Electronics",
                CategoryKind::Books => "Books",
                CategoryKind::Tools => "Tools",
                CategoryKind::CleaningSupplies => "Cleaning Supplies",
                CategoryKind::Decor => "Decor",
                CategoryKind::Other => "Other",
            },
        }
    }

    /// Recognize a label in either language
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        RULES
            .iter()
            .map(|(kind, _)| *kind)
            .chain(std::iter::once(CategoryKind::Other))
            .find(|kind| {
                label == kind.label(LabelSet::Chinese)
                    || label.eq_ignore_ascii_case(kind.label(LabelSet::English))
            })
    }

    /// Inclusive price band used by `ValuePolicy::RandomBand`
    pub fn value_band(&self) -> (u32, u32) {
        match self {
            CategoryKind::Electronics => (1000, 6000),
            CategoryKind::Clothing => (100, 600),
            CategoryKind::FoodBeverage => (10, 110),
            CategoryKind::Medicine => (20, 220),
            _ => (50, 350),
        }
    }
}

/// Match `name` and `notes` against the keyword table
pub fn infer_category(name: &str, notes: Option<&str>) -> CategoryKind {
    let haystack = match notes {
        Some(notes) => format!("{} {}", name, notes),
        None => name.to_string(),
    }
    .to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| mentions(&haystack, k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(CategoryKind::Other)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

fn mentions(haystack: &str, keyword: &str) -> bool {
    if !keyword.is_ascii() {
        return haystack.contains(keyword);
    }
    haystack.match_indices(keyword).any(|(at, _)| {
        let starts_word = !haystack[..at].chars().next_back().map_or(false, is_word_char);
        let rest = &haystack[at + keyword.len()..];
        let ends_word = ["", "s", "es"].iter().any(|suffix| {
            rest.strip_prefix(suffix)
                .map_or(false, |tail| !tail.chars().next().map_or(false, is_word_char))
        });
        starts_word && ends_word
    })
}

/// Rule-based filler for fields the recognizer left empty
#[derive(Debug, Clone)]
pub struct Classifier {
    labels: LabelSet,
    value_policy: ValuePolicy,
    expiry_months: u32,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_options(&ClientOptions::default())
    }
}

impl Classifier {
    /// Build a classifier from client options
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            labels: options.category_labels,
            value_policy: options.value_policy,
            expiry_months: options.expiry_default_months,
        }
    }

    /// Fill one candidate, using today's local date for expiry defaults
    pub fn classify(&self, candidate: &mut RecognitionCandidate) {
        self.classify_on(candidate, Local::now().date_naive());
    }

    /// Fill one candidate relative to `today`
    pub fn classify_on(&self, candidate: &mut RecognitionCandidate, today: NaiveDate) {
        let fields = &mut candidate.fields;

        let kind = match fields.category.as_deref() {
            Some(existing) => CategoryKind::from_label(existing).unwrap_or(CategoryKind::Other),
            None => {
                let kind = infer_category(&fields.name, fields.notes.as_deref());
                fields.category = Some(kind.label(self.labels).to_string());
                kind
            }
        };

        if candidate.needs_expiry_date && fields.expire_date.is_none() {
            fields.expire_date = today.checked_add_months(Months::new(self.expiry_months));
        }

        if fields.value.is_none() {
            fields.value = match self.value_policy {
                ValuePolicy::Unset => None,
                ValuePolicy::Zero => Some(0.0),
                ValuePolicy::RandomBand => {
                    let (low, high) = kind.value_band();
                    Some(rand::thread_rng().gen_range(low..=high) as f64)
                }
            };
        }
    }

    /// Fill every candidate
    pub fn classify_all(&self, candidates: &mut [RecognitionCandidate]) {
        let today = Local::now().date_naive();
        for candidate in candidates.iter_mut() {
            self.classify_on(candidate, today);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn milk_is_food_every_time() {
        let classifier = Classifier::default();
        for _ in 0..5 {
            let mut candidate = RecognitionCandidate::named("蒙牛纯牛奶");
            classifier.classify(&mut candidate);
            assert_eq!(candidate.fields.category.as_deref(), Some("食品饮料"));
        }
    }

    #[test]
    fn english_labels_and_notes_are_used() {
        let options = ClientOptions::default().with_category_labels(LabelSet::English);
        let classifier = Classifier::from_options(&options);
        let mut candidate = RecognitionCandidate::named("Blue box");
        candidate.fields.notes = Some("contains a USB-C Charger".to_string());
        classifier.classify(&mut candidate);
        assert_eq!(candidate.fields.category.as_deref(), Some("Electronics"));
    }

    #[test]
    fn table_order_breaks_ties_and_unknown_is_other() {
        assert_eq!(infer_category("Phone and hammer", None), CategoryKind::Electronics);
        assert_eq!(infer_category("笔记本电脑", None), CategoryKind::Electronics);
        assert_eq!(infer_category("笔记本", None), CategoryKind::Books);
        assert_eq!(infer_category("洗衣液", None), CategoryKind::CleaningSupplies);
        assert_eq!(infer_category("Mystery object", None), CategoryKind::Other);
    }

    #[test]
    fn latin_keywords_match_whole_words() {
        assert_eq!(infer_category("Pillow", None), CategoryKind::Decor);
        assert_eq!(infer_category("Leggings", None), CategoryKind::Other);
        assert_eq!(infer_category("Wall socket", None), CategoryKind::Electronics);
        assert_eq!(infer_category("Price tag", None), CategoryKind::Other);
        assert_eq!(infer_category("Eggs", None), CategoryKind::FoodBeverage);
        assert_eq!(infer_category("Wool socks", None), CategoryKind::Clothing);
        assert_eq!(infer_category("Boxes of cookies", None), CategoryKind::FoodBeverage);
        assert_eq!(infer_category("Cold pills", None), CategoryKind::Medicine);
        assert_eq!(infer_category("蒙牛pillow", None), CategoryKind::Decor);
    }

    #[test]
    fn explicit_category_is_kept() {
        let mut candidate = RecognitionCandidate::named("蒙牛纯牛奶");
        candidate.fields.category = Some("Gifts".to_string());
        Classifier::default().classify(&mut candidate);
        assert_eq!(candidate.fields.category.as_deref(), Some("Gifts"));
    }

    #[test]
    fn expiry_defaults_to_three_months_when_needed() {
        let classifier = Classifier::default();
        let mut needs = RecognitionCandidate::named("Yogurt");
        needs.needs_expiry_date = true;
        classifier.classify_on(&mut needs, date(2024, 11, 30));
        assert_eq!(needs.fields.expire_date, Some(date(2025, 2, 28)));

        let mut explicit = RecognitionCandidate::named("Yogurt");
        explicit.needs_expiry_date = true;
        explicit.fields.expire_date = Some(date(2024, 12, 5));
        classifier.classify_on(&mut explicit, date(2024, 11, 30));
        assert_eq!(explicit.fields.expire_date, Some(date(2024, 12, 5)));

        let mut not_needed = RecognitionCandidate::named("Hammer");
        classifier.classify_on(&mut not_needed, date(2024, 11, 30));
        assert_eq!(not_needed.fields.expire_date, None);
    }

    #[test]
    fn value_policies() {
        let mut unset = RecognitionCandidate::named("Laptop");
        Classifier::default().classify(&mut unset);
        assert_eq!(unset.fields.value, None);

        let zero = Classifier::from_options(&ClientOptions::default().with_value_policy(ValuePolicy::Zero));
        let mut candidate = RecognitionCandidate::named("Laptop");
        zero.classify(&mut candidate);
        assert_eq!(candidate.fields.value, Some(0.0));

        let random =
            Classifier::from_options(&ClientOptions::default().with_value_policy(ValuePolicy::RandomBand));
        for _ in 0..50 {
            let mut candidate = RecognitionCandidate::named("Laptop");
            random.classify(&mut candidate);
            let value = candidate.fields.value.unwrap();
            assert!((1000.0..=6000.0).contains(&value), "value {} outside band", value);
        }

        let mut priced = RecognitionCandidate::named("Laptop");
        priced.fields.value = Some(12.5);
        random.classify(&mut priced);
        assert_eq!(priced.fields.value, Some(12.5));
    }

    #[test]
    fn labels_round_trip_in_both_languages() {
        assert_eq!(CategoryKind::from_label("药品"), Some(CategoryKind::Medicine));
        assert_eq!(CategoryKind::from_label("cleaning supplies"), Some(CategoryKind::CleaningSupplies));
        assert_eq!(CategoryKind::from_label("其他"), Some(CategoryKind::Other));
        assert_eq!(CategoryKind::from_label("Gifts"), None);
    }
}
