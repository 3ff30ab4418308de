//! Tests for error handling

use symview_core::error::{SymviewError, SymviewResult};
use symview_core::types::Address;

#[test]
fn test_symbol_not_found_display()
{
    let error = SymviewError::SymbolNotFound("sensor".to_string());
    let message = format!("{}", error);
    assert!(message.contains("sensor"));
    assert!(message.contains("not found"));
}

#[test]
fn test_entry_not_found_display()
{
    let error = SymviewError::EntryNotFound {
        name: "ticks".to_string(),
        address: Address::new(0xa000_0010),
    };
    let message = format!("{}", error);
    assert!(message.contains("ticks"));
    assert!(message.contains("0xa0000010"));
}

#[test]
fn test_short_read_display()
{
    let error = SymviewError::ShortRead {
        address: Address::new(0x1000),
        expected: 4,
        actual: 2,
    };
    let message = format!("{}", error);
    assert!(message.contains("expected 4"));
    assert!(message.contains("got 2"));
}

#[test]
fn test_not_found_classification()
{
    assert!(SymviewError::TypeNotFound(0x40).is_not_found());
    assert!(SymviewError::MemberNotFound {
        path: "sensor".to_string(),
        member: "gain".to_string(),
    }
    .is_not_found());
    assert!(!SymviewError::MemoryRead {
        address: Address::new(0x1000),
        length: 4,
    }
    .is_not_found());
    assert!(!SymviewError::InvalidArgument("x".to_string()).is_not_found());
}

#[test]
fn test_io_error_conversion()
{
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "firmware.elf");
    let error: SymviewError = io.into();
    assert!(matches!(error, SymviewError::Io(_)));
}

#[test]
fn test_result_type()
{
    // Test that Result type is properly aliased
    let _result: SymviewResult<()> = Ok(());
    let _error_result: SymviewResult<()> = Err(SymviewError::SymbolNotFound("x".to_string()));
}
