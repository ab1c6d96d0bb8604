/// Provides constants and utilities for working with
/// the "vendor_invoice" database table.
pub struct VendorInvoiceTable;

impl VendorInvoiceTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "vendor_invoice";

    /// The column name for the numeric vendor identifier.
    pub const COLUMN_VENDOR_NUMBER: &'static str = "VendorNumber";

    /// The column name for the freight charged on the invoice.
    pub const COLUMN_FREIGHT: &'static str = "Freight";

    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                {} INTEGER NOT NULL,
                {} REAL
            )",
            Self::TABLE_NAME,
            Self::COLUMN_VENDOR_NUMBER,
            Self::COLUMN_FREIGHT
        )
    }
}

/// Provides constants and utilities for working with
/// the "purchases" database table.
pub struct PurchaseTable;

impl PurchaseTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "purchases";

    pub const COLUMN_VENDOR_NUMBER: &'static str = "VendorNumber";
    pub const COLUMN_VENDOR_NAME: &'static str = "VendorName";
    pub const COLUMN_BRAND: &'static str = "Brand";
    pub const COLUMN_DESCRIPTION: &'static str = "Description";

    /// The column name for the unit price paid to the vendor.
    pub const COLUMN_PURCHASE_PRICE: &'static str = "PurchasePrice";

    pub const COLUMN_QUANTITY: &'static str = "Quantity";
    pub const COLUMN_DOLLARS: &'static str = "Dollars";

    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                {} INTEGER NOT NULL,
                {} TEXT,
                {} INTEGER NOT NULL,
                {} TEXT,
                {} REAL,
                {} INTEGER,
                {} REAL
            )",
            Self::TABLE_NAME,
            Self::COLUMN_VENDOR_NUMBER,
            Self::COLUMN_VENDOR_NAME,
            Self::COLUMN_BRAND,
            Self::COLUMN_DESCRIPTION,
            Self::COLUMN_PURCHASE_PRICE,
            Self::COLUMN_QUANTITY,
            Self::COLUMN_DOLLARS
        )
    }
}

/// Provides constants and utilities for working with
/// the "purchase_prices" reference table (list price and volume per brand).
pub struct PurchasePriceTable;

impl PurchasePriceTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "purchase_prices";

    pub const COLUMN_BRAND: &'static str = "Brand";

    /// The column name for the list price of the brand.
    pub const COLUMN_PRICE: &'static str = "Price";

    /// The column name for the package volume. Stored as text in most
    /// inventory exports.
    pub const COLUMN_VOLUME: &'static str = "Volume";

    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                {} INTEGER NOT NULL,
                {} REAL,
                {} TEXT
            )",
            Self::TABLE_NAME,
            Self::COLUMN_BRAND,
            Self::COLUMN_PRICE,
            Self::COLUMN_VOLUME
        )
    }
}

/// Provides constants and utilities for working with
/// the "sales" database table.
pub struct SalesTable;

impl SalesTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "sales";

    /// Vendor identifier. Named differently from the purchase side.
    pub const COLUMN_VENDOR_NO: &'static str = "VendorNo";
    pub const COLUMN_BRAND: &'static str = "Brand";
    pub const COLUMN_SALES_QUANTITY: &'static str = "SalesQuantity";
    pub const COLUMN_SALES_DOLLARS: &'static str = "SalesDollars";
    pub const COLUMN_SALES_PRICE: &'static str = "SalesPrice";
    pub const COLUMN_EXCISE_TAX: &'static str = "ExciseTax";

    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                {} INTEGER NOT NULL,
                {} INTEGER NOT NULL,
                {} INTEGER,
                {} REAL,
                {} REAL,
                {} REAL
            )",
            Self::TABLE_NAME,
            Self::COLUMN_VENDOR_NO,
            Self::COLUMN_BRAND,
            Self::COLUMN_SALES_QUANTITY,
            Self::COLUMN_SALES_DOLLARS,
            Self::COLUMN_SALES_PRICE,
            Self::COLUMN_EXCISE_TAX
        )
    }
}

/// Column layout of the persisted vendor sales summary. The table name is
/// chosen at runtime, so only the columns are constants.
pub struct VendorSalesSummaryTable;

impl VendorSalesSummaryTable {
    /// Output columns in persisted order.
    pub const COLUMNS: [(&'static str, &'static str); 18] = [
        ("VendorNumber", "INTEGER NOT NULL"),
        ("VendorName", "TEXT NOT NULL"),
        ("Brand", "INTEGER NOT NULL"),
        ("Description", "TEXT NOT NULL"),
        ("PurchasePrice", "REAL NOT NULL"),
        ("ActualPrice", "REAL NOT NULL"),
        ("Volume", "REAL NOT NULL"),
        ("TotalSalesQuantity", "REAL NOT NULL"),
        ("TotalSalesDollars", "REAL NOT NULL"),
        ("TotalPurchaseQuantity", "REAL NOT NULL"),
        ("TotalPurchaseDollars", "REAL NOT NULL"),
        ("TotalSalesPrice", "REAL NOT NULL"),
        ("TotalExciseTax", "REAL NOT NULL"),
        ("FreightCost", "REAL NOT NULL"),
        ("GrossProfit", "REAL NOT NULL"),
        // NULL where the denominator of the ratio is zero.
        ("ProfitMargin", "REAL"),
        ("StockTurnover", "REAL"),
        ("SalesToPurchaseRatio", "REAL"),
    ];

    /// SQL statement for creating the summary table under `table_name`.
    ///
    /// The caller is responsible for validating `table_name`.
    pub fn create_table(table_name: &str) -> String {
        let columns = Self::COLUMNS
            .iter()
            .map(|(name, ty)| format!("{name} {ty}"))
            .collect::<Vec<_>>()
            .join(",\n                ");

        format!(
            "CREATE TABLE \"{}\" (
                {}
            )",
            table_name, columns
        )
    }

    /// Parameterised INSERT covering every column in `COLUMNS` order.
    pub fn insert_row(table_name: &str) -> String {
        let names: Vec<&str> = Self::COLUMNS.iter().map(|(name, _)| *name).collect();
        let placeholders = vec!["?"; names.len()].join(", ");

        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table_name,
            names.join(", "),
            placeholders
        )
    }

    pub fn drop_table(table_name: &str) -> String {
        format!("DROP TABLE IF EXISTS \"{}\"", table_name)
    }
}
