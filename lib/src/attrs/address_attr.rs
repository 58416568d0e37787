use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

// 地址类的attribute
//
// mapped-address  alternate-server

// ipv4: family: 0x01, 4 bytes
// ipv6: family: 0x02, 16 bytes

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub fn from_u8(family: u8) -> Result<Self> {
        match family {
            ATTR_FAMILY_IPV4 => Ok(AddressFamily::V4),
            ATTR_FAMILY_IPV6 => Ok(AddressFamily::V6),
            v => Err(Error::malformed(format!("ip family: {:#04x}", v))),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            AddressFamily::V4 => ATTR_FAMILY_IPV4,
            AddressFamily::V6 => ATTR_FAMILY_IPV6,
        }
    }

    pub fn addr_len(self) -> usize {
        match self {
            AddressFamily::V4 => 4,
            AddressFamily::V6 => 16,
        }
    }

    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }
}

/// Layout shared by the plain and xor address attributes:
/// reserved(1) | family(1) | port(2) | address(4 or 16).
pub(crate) fn pack_address_value(family: AddressFamily, port: u16, address: &[u8]) -> Bytes {
    let mut bytes_buf = BytesMut::with_capacity(4 + address.len());

    bytes_buf.put_u8(0);
    bytes_buf.put_u8(family.to_u8());
    bytes_buf.put_u16(port);
    bytes_buf.put_slice(address);

    bytes_buf.freeze()
}

pub(crate) fn unpack_address_value(value: &[u8]) -> Result<(AddressFamily, u16, Bytes)> {
    if value.len() < 4 {
        return Err(Error::malformed(format!(
            "address attr buf len:{} < 4",
            value.len()
        )));
    }

    let family = AddressFamily::from_u8(value[1])?;
    let port = u16::from_be_bytes([value[2], value[3]]);

    let expected = 4 + family.addr_len();
    if value.len() != expected {
        return Err(Error::malformed(format!(
            "{:?} address attr len:{} != {}",
            family,
            value.len(),
            expected
        )));
    }

    Ok((family, port, Bytes::copy_from_slice(&value[4..])))
}

pub(crate) fn ip_from_bytes(family: AddressFamily, address: &[u8]) -> Result<IpAddr> {
    match family {
        AddressFamily::V4 => {
            let addr: [u8; 4] = address
                .try_into()
                .map_err(|_| Error::malformed("ipv4 buf len != 4"))?;
            Ok(IpAddr::V4(Ipv4Addr::from(addr)))
        }
        AddressFamily::V6 => {
            let addr: [u8; 16] = address
                .try_into()
                .map_err(|_| Error::malformed("ipv6 buf len != 16"))?;
            Ok(IpAddr::V6(Ipv6Addr::from(addr)))
        }
    }
}

pub(crate) fn ip_to_bytes(ip: &IpAddr) -> Vec<u8> {
    match ip {
        IpAddr::V4(v) => v.octets().into(),
        IpAddr::V6(v) => v.octets().into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressAttr {
    pub attr_type: u16,
    pub address: SocketAddr,
}

impl AddressAttr {
    pub fn new(attr_type: u16, address: SocketAddr) -> Self {
        Self { attr_type, address }
    }

    pub fn mapped(address: SocketAddr) -> Self {
        Self::new(ATTR_MAPPED_ADDRESS, address)
    }

    pub fn is_address_attr(attr_type: u16) -> bool {
        attr_type == ATTR_MAPPED_ADDRESS || attr_type == ATTR_ALTERNATE_SERVER
    }
}

impl From<AddressAttr> for RawAttr {
    fn from(attr: AddressAttr) -> Self {
        let ip = attr.address.ip();
        let value = pack_address_value(
            AddressFamily::of(&ip),
            attr.address.port(),
            &ip_to_bytes(&ip),
        );

        RawAttr::new(attr.attr_type, value)
    }
}

impl TryFrom<RawAttr> for AddressAttr {
    type Error = Error;

    fn try_from(base_attr: RawAttr) -> Result<Self> {
        let (family, port, address) = unpack_address_value(&base_attr.value)?;
        let ip = ip_from_bytes(family, &address)?;

        Ok(Self {
            attr_type: base_attr.attr_type,
            address: SocketAddr::new(ip, port),
        })
    }
}
