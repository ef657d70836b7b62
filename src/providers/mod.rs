pub mod issa;
pub mod justetf;
pub mod yahoo_finance;

pub use issa::IssaProvider;
pub use justetf::JustEtfProvider;
pub use yahoo_finance::YahooFinanceProvider;
