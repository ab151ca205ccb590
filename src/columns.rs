use std::collections::HashSet;
use std::fmt;

use crate::domain::DashError;

/// Record schema variant. Each shape has its own, disjoint column registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordShape {
    #[default]
    Normal,
    Reservation,
}

impl RecordShape {
    pub fn toggle(self) -> Self {
        match self {
            RecordShape::Normal => RecordShape::Reservation,
            RecordShape::Reservation => RecordShape::Normal,
        }
    }

    /// Field holding the formatted transaction amount for this shape.
    pub fn amount_field(self) -> &'static str {
        match self {
            RecordShape::Normal => "amount",
            RecordShape::Reservation => "paymentTransactionAmount",
        }
    }
}

impl fmt::Display for RecordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordShape::Normal => write!(f, "Normal"),
            RecordShape::Reservation => write!(f, "Reservation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub id: String,
    pub label: String,
    pub visible: bool,
    pub sticky: bool,
}

impl ColumnDescriptor {
    fn new(id: &str, label: &str, visible: bool, sticky: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            visible,
            sticky,
        }
    }
}

/// Ordered column descriptors of one record shape. Order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRegistry {
    shape: RecordShape,
    columns: Vec<ColumnDescriptor>,
}

impl ColumnRegistry {
    pub fn new(shape: RecordShape, columns: Vec<ColumnDescriptor>) -> Result<Self, DashError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in columns.iter() {
            if !seen.insert(column.id.as_str()) {
                return Err(DashError::DuplicateColumn(column.id.clone()));
            }
        }
        Ok(Self { shape, columns })
    }

    pub fn for_shape(shape: RecordShape) -> Result<Self, DashError> {
        let columns = match shape {
            RecordShape::Normal => normal_columns(),
            RecordShape::Reservation => reservation_columns(),
        };
        Self::new(shape, columns)
    }

    pub fn shape(&self) -> RecordShape {
        self.shape
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.id.as_str())
    }

    /// Replaces all descriptors, keeping the registry's shape. Ids and their order must not change.
    pub(crate) fn replace(&mut self, columns: Vec<ColumnDescriptor>) {
        debug_assert!(self.ids().eq(columns.iter().map(|c| c.id.as_str())));
        self.columns = columns;
    }
}

fn normal_columns() -> Vec<ColumnDescriptor> {
    [
        ("supplier", "Supplier name", true, true),
        ("zone", "Zone description", true, false),
        ("zoneCode", "Zone code", true, false),
        ("station", "Station", true, false),
        ("department", "Department location", true, false),
        ("parking", "Parking ID", true, false),
        ("date", "Date", true, true),
        ("amount", "Amount", true, true),
        ("orderId", "Order ID", true, false),
        ("paymentId", "Payment ID", true, false),
        ("clientId", "Client ID", true, false),
        ("customerPhone", "Customer phone", true, false),
        ("email", "Email", true, false),
        ("timeZone", "Time zone", true, false),
        ("localTimeStart", "Local time start", false, false),
        ("localTimeStop", "Local time stop", false, false),
        ("duration", "Duration", false, false),
        ("paidMinutes", "Paid minutes", false, false),
        ("insertTime", "Insert time", false, false),
        ("paymentTime", "Payment time", false, false),
        ("approved", "Approved", false, false),
        ("paymentMethod", "Payment method", false, false),
    ]
    .into_iter()
    .map(|(id, label, visible, sticky)| ColumnDescriptor::new(id, label, visible, sticky))
    .collect()
}

fn reservation_columns() -> Vec<ColumnDescriptor> {
    [
        ("micrositeId", "Microsite ID", true, true),
        ("micrositeName", "Microsite Name", true, false),
        ("paymentTransactionTerminalId", "Payment Transaction Terminal Id", true, false),
        ("paymentTransactionMerchantId", "Payment Transaction Merchant Id", true, false),
        ("paymentTransactionId", "Payment Transaction Id", true, false),
        ("orderPromoCodeId", "Order Promo Code Id", true, false),
        ("orderPromoCodeName", "Order Promo Code Name", true, false),
        ("orderCompletedAt", "Order Completed At", true, false),
        ("orderWorkflowState", "Order Workflow State", true, false),
        ("reservationId", "Reservation Id", true, true),
        ("reservationBeginAt", "Reservation Begin At", true, false),
        ("reservationEndAt", "Reservation End At", true, false),
        ("paymentTransactionAction", "Payment Transaction Action", true, false),
        ("paymentTransactionSuccess", "Payment Transaction Success", true, false),
        ("paymentTransactionAmount", "Payment Transaction Amount", true, true),
        ("paymentTransactionCreatedAt", "Payment Transaction Created At", true, false),
        ("paymentTransactionInstrument", "Payment Transaction Instrument", true, false),
        ("orderId", "Order Id", true, false),
        ("paymentCode", "Payment Code", true, false),
        ("barcodeCode", "Barcode Code", false, false),
        ("facilityId", "Facility Id", false, false),
        ("facilityName", "Facility Name", false, false),
        ("facilityCode", "Facility Code", false, false),
        ("facilityTimeZone", "Facility Time Zone", false, false),
        ("companyID", "Company ID", false, false),
        ("companyName", "Company Name", false, false),
        ("eventID", "Event ID", false, false),
        ("eventName", "Event Name", false, false),
        ("venueID", "Venue ID", false, false),
        ("venueName", "Venue Name", false, false),
        ("lotID", "Lot ID", false, false),
        ("lotName", "Lot Name", false, false),
        ("productID", "Product ID", false, false),
        ("productName", "Product Name", false, false),
        ("productPriceCalculationType", "Product Price Calculation Type", false, false),
        ("productPricePeriodHours", "Product Price Period Hours", false, false),
        ("productTypeID", "Product Type ID", false, false),
        ("productTypeName", "Product Type Name", false, false),
        ("lineItemID", "Line Item ID", false, false),
        ("lineItemWorkflowState", "Line Item Workflow State", false, false),
        ("lineItemTotal", "Line Item Total", false, false),
        ("lineItemPrice", "Line Item Price", false, false),
        ("lineItemParkmobileServiceFee", "Line Item Parkmobile Service Fee", false, false),
        ("lineItemClientServiceFee", "Line Item Client Service Fee", false, false),
        ("lineItemDeliveryFee", "Line Item Delivery Fee", false, false),
        ("lineItemTax", "Line Item Tax", false, false),
        ("lineItemDiscount", "Line Item Discount", false, false),
        ("lineItemProcessingFee", "Line Item Processing Fee", false, false),
        ("lineItemTransactionFee", "Line Item Transaction Fee", false, false),
        ("amountOwedClient", "Amount Owed Client", false, false),
        ("amountOwedParkmobile", "Amount Owed Parkmobile", false, false),
    ]
    .into_iter()
    .map(|(id, label, visible, sticky)| ColumnDescriptor::new(id, label, visible, sticky))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registries_have_unique_ids() {
        for shape in [RecordShape::Normal, RecordShape::Reservation] {
            let registry = ColumnRegistry::for_shape(shape);
            assert!(registry.is_ok(), "{shape} registry has duplicate ids");
        }
        assert_eq!(ColumnRegistry::for_shape(RecordShape::Normal).unwrap().len(), 22);
        assert_eq!(ColumnRegistry::for_shape(RecordShape::Reservation).unwrap().len(), 51);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let columns = vec![
            ColumnDescriptor::new("a", "A", true, false),
            ColumnDescriptor::new("a", "Again", false, false),
        ];
        match ColumnRegistry::new(RecordShape::Normal, columns) {
            Err(DashError::DuplicateColumn(id)) => assert_eq!(id, "a"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn replace_keeps_shape_and_order() {
        let mut registry = ColumnRegistry::for_shape(RecordShape::Normal).unwrap();
        let mut columns = registry.columns().to_vec();
        columns[0].visible = false;
        registry.replace(columns);
        assert_eq!(registry.shape(), RecordShape::Normal);
        assert_eq!(registry.ids().next(), Some("supplier"));
        assert!(!registry.get("supplier").unwrap().visible);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn replace_rejects_reordered_columns() {
        let mut registry = ColumnRegistry::for_shape(RecordShape::Normal).unwrap();
        let mut columns = registry.columns().to_vec();
        columns.swap(0, 1);
        registry.replace(columns);
    }

    #[test]
    fn amount_field_is_a_registered_column() {
        for shape in [RecordShape::Normal, RecordShape::Reservation] {
            let registry = ColumnRegistry::for_shape(shape).unwrap();
            let amount = registry.get(shape.amount_field()).unwrap();
            assert!(amount.sticky);
        }
    }
}
