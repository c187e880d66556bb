//! Protobuf messages exchanged with the upstream.
//!
//! ```text
//! message ProfileRequest  { uint64 id = 1; uint32 flag = 3; }
//! message ProfileEnvelope { AccountInfo account = 1; }
//! message AccountInfo {
//!   uint64 uid = 1; string nickname = 2; uint64 likes = 3;
//!   string region = 4; uint32 level = 5;
//! }
//! ```

/// Request body of every attempt in a batch.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProfileRequest {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint32, tag = "3")]
    pub flag: u32,
}

/// Successful response body.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProfileEnvelope {
    #[prost(message, optional, tag = "1")]
    pub account: ::core::option::Option<AccountInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountInfo {
    #[prost(uint64, tag = "1")]
    pub uid: u64,
    #[prost(string, tag = "2")]
    pub nickname: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub likes: u64,
    #[prost(string, tag = "4")]
    pub region: ::prost::alloc::string::String,
    #[prost(uint32, tag = "5")]
    pub level: u32,
}
