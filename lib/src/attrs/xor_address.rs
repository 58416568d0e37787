use crate::attrs::address_attr::{
    ip_from_bytes, ip_to_bytes, pack_address_value, unpack_address_value, AddressFamily,
};
use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::{Error, Result};
use crate::header::TransId;
use bytes::Bytes;
use std::net::SocketAddr;

// xor-mapped-address 端口和ip需要混淆
// port 和 magic cookie 高 16 位做 xor
// address(ipv4) 和 magic cookie做xor
// address(ipv6) 和 magic cookie + trans_id 做xor

fn xor_port(port: u16) -> u16 {
    port ^ (MAGIC_COOKIE >> 16) as u16
}

fn xor_address_bytes(address: &[u8], trans_id: &TransId) -> Vec<u8> {
    let key = MAGIC_COOKIE_BYTES.iter().chain(trans_id.iter());
    address.iter().zip(key).map(|(a, k)| a ^ k).collect()
}

/// The transform is its own inverse.
pub fn xor_socket_addr(addr: SocketAddr, trans_id: &TransId) -> SocketAddr {
    let ip = addr.ip();
    let family = AddressFamily::of(&ip);
    let xored = xor_address_bytes(&ip_to_bytes(&ip), trans_id);

    match ip_from_bytes(family, &xored) {
        Ok(ip) => SocketAddr::new(ip, xor_port(addr.port())),
        // 长度由 family 决定, 不会走到这里
        Err(_) => addr,
    }
}

pub fn encode_xor_mapped_address(
    family: AddressFamily,
    port: u16,
    address: &[u8],
    trans_id: &TransId,
) -> Result<Bytes> {
    if address.len() != family.addr_len() {
        return Err(Error::malformed(format!(
            "{:?} address len:{} != {}",
            family,
            address.len(),
            family.addr_len()
        )));
    }

    let x_address = xor_address_bytes(address, trans_id);
    Ok(pack_address_value(family, xor_port(port), &x_address))
}

pub fn decode_xor_mapped_address(
    value: &[u8],
    trans_id: &TransId,
) -> Result<(AddressFamily, u16, Bytes)> {
    let (family, x_port, x_address) = unpack_address_value(value)?;
    let address = xor_address_bytes(&x_address, trans_id);

    Ok((family, xor_port(x_port), Bytes::from(address)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorMappedAddress {
    pub address: SocketAddr,
    pub trans_id: TransId,
}

impl XorMappedAddress {
    pub fn new(trans_id: TransId, address: SocketAddr) -> Self {
        Self { trans_id, address }
    }

    pub fn from_base_attr(base_attr: &RawAttr, trans_id: &TransId) -> Result<Self> {
        if base_attr.attr_type != ATTR_XOR_MAPPED_ADDRESS {
            return Err(Error::malformed(format!(
                "attr {:#06x} is not xor-mapped-address",
                base_attr.attr_type
            )));
        }

        let (family, port, address) = decode_xor_mapped_address(&base_attr.value, trans_id)?;
        let ip = ip_from_bytes(family, &address)?;

        Ok(Self {
            address: SocketAddr::new(ip, port),
            trans_id: *trans_id,
        })
    }
}

impl From<XorMappedAddress> for RawAttr {
    fn from(attr: XorMappedAddress) -> Self {
        let xor_addr = xor_socket_addr(attr.address, &attr.trans_id);
        let ip = xor_addr.ip();
        let value = pack_address_value(AddressFamily::of(&ip), xor_addr.port(), &ip_to_bytes(&ip));

        RawAttr::new(ATTR_XOR_MAPPED_ADDRESS, value)
    }
}
