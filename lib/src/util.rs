use std::fmt::Write as _;

pub fn print_bytes(buf: &[u8], separator: &str, row_width: usize) -> String {
    let mut hex = String::new();
    buf.iter().enumerate().for_each(|(x, y)| {
        let _ = write!(hex, "{:02X}", y);
        if (x + 1) % row_width == 0 {
            hex.push('\n');
        } else {
            hex.push_str(separator);
        }
    });

    hex
}

// 补齐到 4 字节边界需要的字节数
pub fn padding_len(len: usize) -> usize {
    (4 - len % 4) % 4
}

// class: 3 bit, number: 8 bit (0-99)
pub fn pack_error_code(code: u16) -> (u8, u8) {
    let class = (code / 100) as u8 & 0x07;
    let number = (code % 100) as u8;

    (class, number)
}

pub fn unpack_error_code(class: u8, number: u8) -> u16 {
    (class & 0x07) as u16 * 100 + number as u16
}
