use ethereum_types::Address;

const EIP1167_PREFIX: [u8; 10] = [0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d, 0x3d, 0x36, 0x3d, 0x73];
const EIP1167_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

/// Returns the implementation address when `code` is an EIP-1167 minimal proxy.
pub fn minimal_proxy_target(code: &[u8]) -> Option<Address> {
    if code.len() != EIP1167_PREFIX.len() + 20 + EIP1167_SUFFIX.len() {
        return None;
    }
    let (prefix, rest) = code.split_at(EIP1167_PREFIX.len());
    let (target, suffix) = rest.split_at(20);
    (prefix == EIP1167_PREFIX && suffix == EIP1167_SUFFIX).then(|| Address::from_slice(target))
}
