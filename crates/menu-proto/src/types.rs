#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Opcode {
    Set = 0x01,
    Get = 0x02,
    Del = 0x03,
    Ping = 0x04,
    Stats = 0x05,

    Subscribe = 0x20,
    Unsubscribe = 0x21,
}

impl Opcode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(Opcode::Set),
            0x02 => Some(Opcode::Get),
            0x03 => Some(Opcode::Del),
            0x04 => Some(Opcode::Ping),
            0x05 => Some(Opcode::Stats),
            0x20 => Some(Opcode::Subscribe),
            0x21 => Some(Opcode::Unsubscribe),
            _ => None,
        }
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,

    ErrBadPayload = 0x10,
    ErrTooLarge = 0x12,
    ErrInternal = 0x13,
    ErrLagged = 0x15,
    ErrInvalidKeyFormat = 0x16,
    ErrUnknownOp = 0x17,

    /// Server-initiated frame on a subscription stream.
    Push = 0x80,
}

impl From<u8> for Status {
    fn from(v: u8) -> Self {
        match v {
            0x00 => Status::Ok,
            0x01 => Status::NotFound,
            0x10 => Status::ErrBadPayload,
            0x12 => Status::ErrTooLarge,
            0x13 => Status::ErrInternal,
            0x15 => Status::ErrLagged,
            0x16 => Status::ErrInvalidKeyFormat,
            0x17 => Status::ErrUnknownOp,
            0x80 => Status::Push,
            _ => Status::ErrInternal,
        }
    }
}
