use std::collections::HashMap;

use chrono::{Days, NaiveDate, NaiveTime, TimeDelta};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::columns::{ColumnRegistry, RecordShape};
use crate::domain::DashError;

/// A parking authority / supplier. `value` is the filter discriminant stored on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    pub value: &'static str,
    pub label: &'static str,
}

impl Operator {
    fn short_name(&self) -> &'static str {
        self.label.split(' ').next().unwrap_or(self.label)
    }
}

pub const OPERATORS: [Operator; 7] = [
    Operator { value: "stockholm", label: "Stockholm Parking" },
    Operator { value: "gothenburg", label: "Gothenburg City Parking" },
    Operator { value: "malmo", label: "Malmö Parking Authority" },
    Operator { value: "uppsala", label: "Uppsala Municipal Parking" },
    Operator { value: "linkoping", label: "Linköping Parking Services" },
    Operator { value: "orebro", label: "Örebro Parking Management" },
    Operator { value: "vasteras", label: "Västerås City Parking" },
];

pub fn operator_label(value: &str) -> Option<&'static str> {
    OPERATORS.iter().find(|o| o.value == value).map(|o| o.label)
}

/// Name of the discriminant column in loaded data files.
pub const OPERATOR_FIELD: &str = "supplierValue";

const PAYMENT_METHODS: [&str; 4] = ["CREDIT_CARD", "WALLET", "GOOGLE_PAY", "APPLE_PAY"];

/// A flat transaction: display-ready strings keyed by column id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: usize,
    operator: String,
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new(id: usize, operator: impl Into<String>, fields: HashMap<String, String>) -> Self {
        Self {
            id,
            operator: operator.into(),
            fields,
        }
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.as_str())
    }

    /// Cell content for rendering; unknown fields render empty.
    pub fn cell(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }
}

/// Records of a single shape, in generation (or file) order.
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    /// Builds a store, checking that every column of `registry` resolves in every record.
    pub fn new(registry: &ColumnRegistry, records: Vec<Record>) -> Result<Self, DashError> {
        for record in records.iter() {
            if let Some(missing) = registry.ids().find(|id| record.get(id).is_none()) {
                return Err(DashError::MissingField {
                    record: record.id,
                    field: missing.to_string(),
                });
            }
        }
        debug!("Validated {} {} records", records.len(), registry.shape());
        Ok(Self { records })
    }

    pub fn empty() -> Self {
        Self { records: Vec::new() }
    }

    /// Mock transactions for `shape`. The same seed and day always give the same store.
    pub fn generate(shape: RecordShape, nrows: usize, seed: u64, today: NaiveDate) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let records = (0..nrows)
            .map(|i| match shape {
                RecordShape::Normal => mock_normal(&mut rng, i, today),
                RecordShape::Reservation => mock_reservation(&mut rng, i, today),
            })
            .collect::<Vec<Record>>();
        info!("Generated {} mock {} transactions", records.len(), shape);
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, idx: usize) -> Option<&Record> {
        self.records.get(idx)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

fn euro(value: f64) -> String {
    format!("€{value:.2}")
}

fn days_before(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(today)
}

fn into_fields(pairs: Vec<(&str, String)>) -> HashMap<String, String> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn mock_normal(rng: &mut StdRng, i: usize, today: NaiveDate) -> Record {
    let op = OPERATORS[rng.gen_range(0..OPERATORS.len())];
    let date = days_before(today, rng.gen_range(0..30));
    let start = NaiveTime::from_hms_opt(rng.gen_range(6..22), rng.gen_range(0..60), 0)
        .unwrap_or(NaiveTime::MIN);
    let paid_minutes: i64 = rng.gen_range(15..240);
    let (stop, _) = start.overflowing_add_signed(TimeDelta::minutes(paid_minutes));
    let letter = char::from(b'A' + rng.gen_range(0..26u8));

    let fields = into_fields(vec![
        ("supplier", op.label.to_string()),
        ("zone", format!("{} Zone {}", op.short_name(), rng.gen_range(1..=10))),
        ("zoneCode", rng.gen_range(0..999_999).to_string()),
        ("station", format!("{} Station {}", op.short_name(), rng.gen_range(1..=15))),
        ("department", format!("Dept {letter}{}", rng.gen_range(0..100))),
        (
            "parking",
            format!(
                "{},{},{}",
                rng.gen_range(0..999),
                rng.gen_range(0..999),
                rng.gen_range(0..999)
            ),
        ),
        ("date", date.format("%Y-%m-%d").to_string()),
        ("amount", euro(rng.gen_range(0.0..1000.0))),
        ("orderId", format!("ORD-{}", rng.gen_range(1_000_000..10_000_000))),
        ("paymentId", format!("PAY-{}", rng.gen_range(1_000_000..10_000_000))),
        ("clientId", format!("CLT-{}", rng.gen_range(10_000..100_000))),
        (
            "customerPhone",
            format!(
                "+1 {}-{}-{}",
                rng.gen_range(100..1000),
                rng.gen_range(100..1000),
                rng.gen_range(1000..10_000)
            ),
        ),
        ("email", format!("customer{i}@example.com")),
        ("timeZone", "EST".to_string()),
        ("localTimeStart", start.format("%H:%M").to_string()),
        ("localTimeStop", stop.format("%H:%M").to_string()),
        ("duration", format!("{}h {:02}m", paid_minutes / 60, paid_minutes % 60)),
        ("paidMinutes", paid_minutes.to_string()),
        ("insertTime", format!("{} {}", date.format("%Y-%m-%d"), start.format("%H:%M:%S"))),
        ("paymentTime", format!("{} {}", date.format("%Y-%m-%d"), start.format("%H:%M:%S"))),
        ("approved", if rng.gen_bool(0.95) { "Yes" } else { "No" }.to_string()),
        (
            "paymentMethod",
            PAYMENT_METHODS[rng.gen_range(0..PAYMENT_METHODS.len())].to_string(),
        ),
    ]);
    Record::new(i + 1, op.value, fields)
}

fn mock_reservation(rng: &mut StdRng, i: usize, today: NaiveDate) -> Record {
    let op = OPERATORS[rng.gen_range(0..OPERATORS.len())];
    let begin = days_before(today, rng.gen_range(0..30))
        .and_hms_opt(rng.gen_range(0..24), 0, 0)
        .unwrap_or_else(|| today.and_time(NaiveTime::MIN));
    let end = begin + TimeDelta::hours(rng.gen_range(0..48));
    let ordered = begin - TimeDelta::days(1);
    let iso = "%Y-%m-%dT%H:%M:%S%.3fZ";
    let promo = rng.gen_bool(0.3);
    let lot = char::from(b'A' + rng.gen_range(0..26u8));

    let fields = into_fields(vec![
        ("micrositeId", format!("MSITE-{}", rng.gen_range(10_000..100_000))),
        ("micrositeName", format!("{} Microsite", op.label)),
        ("paymentTransactionTerminalId", format!("TERM-{}", rng.gen_range(1000..10_000))),
        ("paymentTransactionMerchantId", format!("MERCH-{}", rng.gen_range(100_000..1_000_000))),
        ("paymentTransactionId", format!("PTRANS-{}", rng.gen_range(1_000_000..10_000_000))),
        (
            "orderPromoCodeId",
            if promo { format!("PROMO-{}", rng.gen_range(100..1000)) } else { String::new() },
        ),
        (
            "orderPromoCodeName",
            if promo { format!("SUMMER{}", rng.gen_range(0..100)) } else { String::new() },
        ),
        ("orderCompletedAt", ordered.format(iso).to_string()),
        (
            "orderWorkflowState",
            if rng.gen_bool(0.1) { "PENDING" } else { "COMPLETED" }.to_string(),
        ),
        ("reservationId", format!("RES-{}", rng.gen_range(100_000..1_000_000))),
        ("reservationBeginAt", begin.format(iso).to_string()),
        ("reservationEndAt", end.format(iso).to_string()),
        ("paymentTransactionAction", "PURCHASE".to_string()),
        (
            "paymentTransactionSuccess",
            if rng.gen_bool(0.95) { "TRUE" } else { "FALSE" }.to_string(),
        ),
        ("paymentTransactionAmount", euro(rng.gen_range(0.0..1000.0))),
        ("paymentTransactionCreatedAt", ordered.format(iso).to_string()),
        (
            "paymentTransactionInstrument",
            if rng.gen_bool(0.5) { "CREDIT_CARD" } else { "PAYPAL" }.to_string(),
        ),
        ("orderId", format!("ORD-{}", rng.gen_range(1_000_000..10_000_000))),
        ("paymentCode", format!("PC-{}", rng.gen_range(1000..10_000))),
        ("barcodeCode", format!("BAR-{}", rng.gen_range(10_000_000..100_000_000))),
        ("facilityId", format!("FAC-{}", rng.gen_range(100..1000))),
        ("facilityName", format!("{} Facility", op.short_name())),
        ("facilityCode", format!("FC-{}", rng.gen_range(100..1000))),
        ("facilityTimeZone", "CET".to_string()),
        ("companyID", format!("COMP-{}", rng.gen_range(100..1000))),
        ("companyName", op.label.to_string()),
        ("eventID", format!("EV-{}", rng.gen_range(1000..10_000))),
        ("eventName", format!("Parking Event {}", rng.gen_range(0..100))),
        ("venueID", format!("VEN-{}", rng.gen_range(100..1000))),
        ("venueName", format!("{} Venue", op.short_name())),
        ("lotID", format!("LOT-{}", rng.gen_range(100..1000))),
        ("lotName", format!("Parking Lot {lot}")),
        ("productID", format!("PROD-{}", rng.gen_range(1000..10_000))),
        ("productName", format!("Parking Slot {}", rng.gen_range(0..1000))),
        (
            "productPriceCalculationType",
            if rng.gen_bool(0.5) { "FLAT" } else { "HOURLY" }.to_string(),
        ),
        ("productPricePeriodHours", rng.gen_range(1..=24).to_string()),
        ("productTypeID", format!("PTYPE-{}", rng.gen_range(10..100))),
        ("productTypeName", "RESERVATION".to_string()),
        ("lineItemID", format!("ITEM-{}", rng.gen_range(10_000..100_000))),
        ("lineItemWorkflowState", "COMPLETED".to_string()),
        ("lineItemTotal", euro(rng.gen_range(0.0..1000.0))),
        ("lineItemPrice", euro(rng.gen_range(0.0..800.0))),
        ("lineItemParkmobileServiceFee", euro(rng.gen_range(0.0..50.0))),
        ("lineItemClientServiceFee", euro(rng.gen_range(0.0..30.0))),
        ("lineItemDeliveryFee", euro(rng.gen_range(0.0..20.0))),
        ("lineItemTax", euro(rng.gen_range(0.0..100.0))),
        ("lineItemDiscount", euro(rng.gen_range(0.0..50.0))),
        ("lineItemProcessingFee", euro(rng.gen_range(0.0..25.0))),
        ("lineItemTransactionFee", euro(rng.gen_range(0.0..15.0))),
        ("amountOwedClient", euro(rng.gen_range(0.0..700.0))),
        ("amountOwedParkmobile", euro(rng.gen_range(0.0..300.0))),
    ]);
    Record::new(i + 1, op.value, fields)
}
