use hickory_proto::rr::RecordType as HickoryRecordType;
use sinkhole_domain::RecordType;

/// Conversions between the domain record type and hickory's, through the
/// numeric wire code so no type is ever lost.
pub struct RecordTypeMapper;

impl RecordTypeMapper {
    pub fn to_hickory(record_type: &RecordType) -> HickoryRecordType {
        HickoryRecordType::from(record_type.code())
    }

    pub fn from_hickory(hickory_type: HickoryRecordType) -> RecordType {
        RecordType::from(u16::from(hickory_type))
    }
}
