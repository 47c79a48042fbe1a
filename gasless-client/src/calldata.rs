//! `__execute__` calldata encoding.

use gasless_core::types::{selector_from_name, CairoVersion, Call, Felt};

fn felt_len(len: usize) -> Felt {
    Felt::from(len as u64)
}

/// Encodes a call batch as account `__execute__` calldata.
///
/// Cairo 1 accounts take an array of `(to, selector, calldata)` structs.
/// Cairo 0 accounts take a call array of `(to, selector, offset, len)`
/// followed by the concatenated calldata.
pub fn get_execute_calldata(calls: &[Call], version: CairoVersion) -> Vec<Felt> {
    let mut out = vec![felt_len(calls.len())];

    match version {
        CairoVersion::One => {
            for call in calls {
                out.push(call.contract_address);
                out.push(selector_from_name(&call.entrypoint));
                out.push(felt_len(call.calldata.len()));
                out.extend_from_slice(&call.calldata);
            }
        }
        CairoVersion::Zero => {
            let mut offset = 0usize;
            for call in calls {
                out.push(call.contract_address);
                out.push(selector_from_name(&call.entrypoint));
                out.push(felt_len(offset));
                out.push(felt_len(call.calldata.len()));
                offset += call.calldata.len();
            }
            out.push(felt_len(offset));
            for call in calls {
                out.extend_from_slice(&call.calldata);
            }
        }
    }

    out
}
