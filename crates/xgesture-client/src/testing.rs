//! In-memory server used by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use xgesture_protocol::{
    error_packet, ByteOrder, ErrorCode, EventMask, GrabReply, GrabStatus, Request,
    SelectedEventsReply, SerialState, VersionReply, Window, MAJOR_VERSION, MINOR_VERSION,
    PATCH_VERSION,
};

use crate::error::{TransportError, TransportResult};
use crate::transport::{ExtensionCodec, ExtensionCodes, Transport};

/// Core protocol error code for an unknown major opcode.
const BAD_REQUEST: u8 = 1;

pub(crate) const CODES: ExtensionCodes = ExtensionCodes {
    major_opcode: 140,
    first_event: 0x40,
    first_error: 150,
};

/// Answers gesture requests the way a server would and records traffic.
pub(crate) struct FakeServer {
    order: ByteOrder,
    codes: Option<ExtensionCodes>,
    replies: VecDeque<Vec<u8>>,
    selections: HashMap<Window, EventMask>,
    grabs: HashSet<(Window, u8, u8)>,
    sequence: u16,
    /// Raw requests in the order they were sent.
    pub sent: Vec<Vec<u8>>,
    /// Number of extension registry lookups.
    pub extension_queries: usize,
    /// Codecs installed by the client.
    pub codecs: Vec<Arc<dyn ExtensionCodec>>,
    /// Lose every reply.
    pub fail_replies: bool,
    /// Refuse to accept requests.
    pub fail_sends: bool,
    /// Answer QueryVersion with an error packet.
    pub reject_version: bool,
    /// Fail the extension lookup itself.
    pub fail_lookup: bool,
    /// Answer the next request expecting a reply with this error code.
    pub reject_next: Option<u8>,
}

impl FakeServer {
    /// A server advertising the extension at [`CODES`].
    pub fn new() -> Self {
        Self::with_codes(ByteOrder::LsbFirst, Some(CODES))
    }

    /// A server without the extension.
    pub fn without_extension() -> Self {
        Self::with_codes(ByteOrder::LsbFirst, None)
    }

    pub fn with_codes(order: ByteOrder, codes: Option<ExtensionCodes>) -> Self {
        Self {
            order,
            codes,
            replies: VecDeque::new(),
            selections: HashMap::new(),
            grabs: HashSet::new(),
            sequence: 0,
            sent: Vec::new(),
            extension_queries: 0,
            codecs: Vec::new(),
            fail_replies: false,
            fail_sends: false,
            reject_version: false,
            fail_lookup: false,
            reject_next: None,
        }
    }

    /// Requests sent, excluding QueryVersion.
    pub fn operation_requests(&self) -> usize {
        self.sent
            .iter()
            .filter(|r| !matches!(Request::decode(r, self.order), Ok((_, Request::QueryVersion))))
            .count()
    }

    fn answer(&mut self, data: &[u8]) -> Option<Vec<u8>> {
        let Some(codes) = self.codes else {
            return Some(self.error(BAD_REQUEST, data).to_vec());
        };
        let (major, request) = match Request::decode(data, self.order) {
            Ok(decoded) => decoded,
            Err(_) => return Some(self.error(BAD_REQUEST, data).to_vec()),
        };
        if major != codes.major_opcode {
            return Some(self.error(BAD_REQUEST, data).to_vec());
        }

        if !matches!(request, Request::SelectEvents { .. }) {
            if let Some(code) = self.reject_next.take() {
                return Some(self.error(code, data).to_vec());
            }
        }

        let sequence = self.sequence;
        let reply = match request {
            Request::QueryVersion if self.reject_version => {
                let code = codes.first_error + ErrorCode::OperationNotSupported as u8;
                self.error(code, data)
            }
            Request::QueryVersion => VersionReply {
                sequence,
                major: MAJOR_VERSION,
                minor: MINOR_VERSION,
                patch: PATCH_VERSION,
            }
            .encode(self.order),
            Request::SelectEvents { window, mask } => {
                self.selections.insert(window, mask);
                return None;
            }
            Request::GetSelectedEvents { window } => SelectedEventsReply {
                sequence,
                mask: self.selections.get(&window).copied().unwrap_or_default(),
            }
            .encode(self.order),
            Request::GrabEvent(params) => {
                let key = (params.window, params.event_type, params.num_finger);
                let status = if self.grabs.insert(key) {
                    GrabStatus::SUCCESS
                } else {
                    GrabStatus::GRABBED_ALREADY
                };
                GrabReply { sequence, status }.encode(self.order)
            }
            Request::UngrabEvent(params) => {
                self.grabs
                    .remove(&(params.window, params.event_type, params.num_finger));
                GrabReply {
                    sequence,
                    status: GrabStatus::SUCCESS,
                }
                .encode(self.order)
            }
        };
        Some(reply.to_vec())
    }

    fn error(&self, code: u8, data: &[u8]) -> [u8; 32] {
        let major = data.first().copied().unwrap_or(0);
        let minor = data.get(1).copied().unwrap_or(0);
        error_packet(self.order, code, self.sequence, major, u16::from(minor))
    }
}

impl Transport for FakeServer {
    fn byte_order(&self) -> ByteOrder {
        self.order
    }

    fn query_extension(&mut self, name: &str) -> TransportResult<Option<ExtensionCodes>> {
        self.extension_queries += 1;
        if self.fail_lookup {
            return Err(TransportError::Closed);
        }
        Ok(self.codes.filter(|_| name == xgesture_protocol::EXTENSION_NAME))
    }

    fn register_codec(&mut self, codec: Arc<dyn ExtensionCodec>) -> TransportResult<()> {
        self.codecs.push(codec);
        Ok(())
    }

    fn send_request(&mut self, request: &[u8]) -> TransportResult<()> {
        if self.fail_sends {
            return Err(TransportError::Other("broken pipe".to_string()));
        }
        self.sent.push(request.to_vec());
        self.sequence = self.sequence.wrapping_add(1);
        if let Some(reply) = self.answer(request) {
            self.replies.push_back(reply);
        }
        Ok(())
    }

    fn await_reply(&mut self) -> TransportResult<Vec<u8>> {
        if self.fail_replies {
            return Err(TransportError::Closed);
        }
        self.replies
            .pop_front()
            .ok_or_else(|| TransportError::Other("no reply pending".to_string()))
    }

    fn serial_state(&self) -> SerialState {
        let serial = u64::from(self.sequence);
        SerialState::new(serial, serial)
    }
}
